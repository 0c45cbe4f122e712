use std::sync::Arc;

use pingate::{
    AccessGate, CipherMode, GateConfig, GroupSelection, ItemKind, ItemRef, MemoryPersistence,
    PinGateError, Protectable,
};

/// A launcher note as the export routine sees it.
#[derive(Debug, Clone, PartialEq)]
struct Note {
    id: String,
    title: String,
    content: String,
}

impl Protectable for Note {
    fn item_ref(&self) -> ItemRef {
        ItemRef::new(self.id.clone(), ItemKind::Note)
    }

    fn protected_value(&self) -> &str {
        &self.content
    }

    fn set_protected_value(&mut self, value: String) {
        self.content = value;
    }
}

fn note(id: &str, content: &str) -> Note {
    Note {
        id: id.into(),
        title: format!("title {id}"),
        content: content.into(),
    }
}

#[test]
fn test_bulk_unlock_sorts_items() {
    let gate = AccessGate::new(
        &GateConfig::with_mode(CipherMode::Primary),
        Arc::new(MemoryPersistence::new()),
    );
    let personal = gate.credentials().add_group("Personal", "1111", "").unwrap();
    let work = gate.credentials().add_group("Work", "2222", "").unwrap();
    let secret = gate.credentials().add_group("Secret", "3333", "").unwrap();

    let n_personal = gate
        .protect(&ItemRef::note("n1"), &personal, "1111", "groceries")
        .unwrap();
    let n_work = gate
        .protect(&ItemRef::note("n2"), &work, "2222", "roadmap")
        .unwrap();
    let n_secret = gate
        .protect(&ItemRef::note("n3"), &secret, "3333", "diary")
        .unwrap();

    let items = vec![
        note("n0", "plain note"),
        note("n1", &n_personal),
        note("n2", &n_work),
        note("n3", &n_secret),
    ];
    let selections = [
        GroupSelection::new(&personal, "1111"),
        GroupSelection::new(&work, "9999"),
    ];

    let result = gate.unlock_for_export(items, &selections);

    let contents: Vec<(&str, &str)> = result
        .items
        .iter()
        .map(|n| (n.id.as_str(), n.content.as_str()))
        .collect();
    assert_eq!(contents, vec![("n0", "plain note"), ("n1", "groceries")]);
    assert_eq!(result.items[1].title, "title n1");

    assert_eq!(result.report.passed_through, 1);
    assert_eq!(result.report.decrypted, 1);
    assert_eq!(result.report.skipped, 2);
    assert_eq!(result.report.failed, 0);
    assert!(result.report.verified_groups.contains(&personal));
    assert!(result.report.rejected_groups.contains(&work));
}

#[test]
fn test_corrupt_item_in_verified_group_is_excluded() {
    let gate = AccessGate::new(
        &GateConfig::with_mode(CipherMode::Fallback),
        Arc::new(MemoryPersistence::new()),
    );
    let g1 = gate.credentials().add_group("Bank", "4242", "").unwrap();
    let good = gate.protect(&ItemRef::note("n1"), &g1, "4242", "ok").unwrap();
    gate.protect(&ItemRef::note("n2"), &g1, "4242", "lost").unwrap();

    let result = gate.unlock_for_export(
        vec![note("n1", &good), note("n2", "***")],
        &[GroupSelection::new(&g1, "4242")],
    );
    assert_eq!(result.items, vec![note("n1", "ok")]);
    assert_eq!(result.report.failed, 1);
}

#[test]
fn test_validate_selection_reports_kind() {
    let gate = AccessGate::new(&GateConfig::default(), Arc::new(MemoryPersistence::new()));
    let g1 = gate.credentials().add_group("Bank", "4242", "").unwrap();

    assert!(gate.validate_selection(&GroupSelection::new(&g1, "4242")).is_ok());
    assert!(matches!(
        gate.validate_selection(&GroupSelection::new(&g1, "4243")),
        Err(PinGateError::WrongPin)
    ));
    assert!(matches!(
        gate.validate_selection(&GroupSelection::new("gone", "4242")),
        Err(PinGateError::UnknownGroup(_))
    ));
}
