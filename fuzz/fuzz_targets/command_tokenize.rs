#![no_main]

use libfuzzer_sys::fuzz_target;
use tau_governance::CommandSet;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let commands = CommandSet::from_body(Some(&*raw));
    for command in commands.iter() {
        assert!(command.text().starts_with('/'));
        assert!(command.text().len() > 1);
        let matches = commands.prefix(command.text());
        assert!(matches
            .iter()
            .any(|entry| std::ptr::eq(entry.command, command) && entry.args.is_empty()));
    }
    assert_eq!(commands.prefix("/"), commands.prefix("/"));
});
