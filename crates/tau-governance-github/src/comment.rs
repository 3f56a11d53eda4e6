//! Rendering of bot comments posted on issues and pull requests.

use tau_governance::event_context::{EventContext, RepositoryContext};

const UPSTREAM_PROJECT: &str = "[DeFiCh/oss-governance](https://github.com/DeFiCh/oss-governance)";

/// Substitutes `$AUTHOR` and `$ISSUE_AUTHOR` (first occurrence of each)
/// and appends the details footer.
pub fn render_comment(body: &str, context: &EventContext, config_path: &str) -> String {
    let sender = context
        .sender
        .as_ref()
        .map(|sender| sender.login.as_str())
        .unwrap_or_default();
    let issue_author = context.issue_author.as_deref().unwrap_or_default();

    let mut rendered = body.replacen("$AUTHOR", sender, 1);
    rendered = rendered.replacen("$ISSUE_AUTHOR", issue_author, 1);
    rendered.push_str(&render_details_footer(
        context.repository.as_ref(),
        config_path,
    ));
    rendered
}

pub fn render_details_footer(repository: Option<&RepositoryContext>, config_path: &str) -> String {
    let field = |value: Option<&Option<String>>| {
        value
            .and_then(|value| value.as_deref())
            .unwrap_or_default()
            .to_string()
    };
    let owner = format!(
        "[{}]({})",
        field(repository.map(|repository| &repository.owner_login)),
        field(repository.map(|repository| &repository.owner_html_url))
    );
    let introduction = if repository.is_some_and(|repository| repository.owner_is_organization) {
        format!(
            "I am a bot created to help the {owner} developers manage community feedback and contributions."
        )
    } else {
        format!("I am a bot created to help {owner} manage community feedback and contributions.")
    };
    let manifest = format!(
        "You can check out my [manifest file]({}/blob/{}/{config_path}) to understand my behavior and what I can do.",
        field(repository.map(|repository| &repository.html_url)),
        field(repository.map(|repository| &repository.default_branch))
    );
    format!(
        "\n<details><summary>Details</summary>\n\n{introduction} {manifest} If you want to use this for your project, you can check out the {UPSTREAM_PROJECT} repository.\n\n</details>"
    )
}
