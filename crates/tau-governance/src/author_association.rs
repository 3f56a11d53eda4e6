use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
/// Author associations a rule is allowed to run for.
///
/// `author` is accepted in policy files but GitHub never reports it as an
/// association, so it grants nothing on its own.
pub struct AuthorAssociationGate {
    #[serde(default)]
    pub author: bool,
    #[serde(default)]
    pub collaborator: bool,
    #[serde(default)]
    pub contributor: bool,
    #[serde(default)]
    pub first_timer: bool,
    #[serde(default)]
    pub first_time_contributor: bool,
    #[serde(default)]
    pub mannequin: bool,
    #[serde(default)]
    pub member: bool,
    #[serde(default)]
    pub none: bool,
    #[serde(default)]
    pub owner: bool,
}

impl AuthorAssociationGate {
    pub fn allows(&self, association: Option<&str>) -> bool {
        match association.map(str::trim) {
            Some("COLLABORATOR") => self.collaborator,
            Some("CONTRIBUTOR") => self.contributor,
            Some("FIRST_TIMER") => self.first_timer,
            Some("FIRST_TIME_CONTRIBUTOR") => self.first_time_contributor,
            Some("MANNEQUIN") => self.mannequin,
            Some("MEMBER") => self.member,
            Some("NONE") => self.none,
            Some("OWNER") => self.owner,
            _ => false,
        }
    }
}

/// A missing gate lets every association through.
pub fn is_author_association_allowed(
    gate: Option<&AuthorAssociationGate>,
    association: Option<&str>,
) -> bool {
    gate.map_or(true, |gate| gate.allows(association))
}
