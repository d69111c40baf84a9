use department_core::db::migrations::latest_version;
use department_core::db::open_db_in_memory;
use department_core::{
    DepartmentChanges, DepartmentQuery, DepartmentRepository, NewDepartment, Predicate,
    RepoError, SqliteDepartmentRepository, TextColumn,
};
use rusqlite::Connection;
use uuid::Uuid;

fn new_department(name: &str, floor: i32) -> NewDepartment {
    NewDepartment {
        name: name.to_string(),
        floor,
        email: None,
        phone_number: None,
    }
}

#[test]
fn insert_assigns_id_and_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();

    let mut draft = new_department("Finance", 4);
    draft.email = Some("finance@corp.io".to_string());
    let created = repo.insert(&draft).unwrap();

    assert_eq!(created.id.get_version_num(), 4);
    assert_eq!(created.name, "Finance");
    assert_eq!(created.floor, 4);
    assert_eq!(created.email.as_deref(), Some("finance@corp.io"));
    assert_eq!(created.phone_number, None);
    assert_eq!(created.deleted_at, None);
    assert!(created.updated_at > 0);

    let loaded = repo.find_by_id(created.id, false).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn partial_update_touches_only_present_columns() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();

    let mut draft = new_department("Support", 1);
    draft.email = Some("support@corp.io".to_string());
    draft.phone_number = Some("0123".to_string());
    let created = repo.insert(&draft).unwrap();

    let changes = DepartmentChanges {
        floor: Some(7),
        email: Some(None),
        ..DepartmentChanges::default()
    };
    let updated = repo.apply_partial_update(created.id, &changes).unwrap();

    assert_eq!(updated.name, "Support");
    assert_eq!(updated.floor, 7);
    assert_eq!(updated.email, None);
    assert_eq!(updated.phone_number.as_deref(), Some("0123"));
    assert!(updated.updated_at >= created.updated_at);
}

#[test]
fn partial_update_refreshes_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    let created = repo.insert(&new_department("Audit", 2)).unwrap();

    conn.execute("UPDATE departments SET updated_at = 1000;", [])
        .unwrap();
    let updated = repo
        .apply_partial_update(created.id, &DepartmentChanges::default())
        .unwrap();

    assert!(updated.updated_at > 1000);
}

#[test]
fn writes_to_missing_or_deleted_rows_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();

    let missing = Uuid::new_v4();
    let err = repo
        .apply_partial_update(missing, &DepartmentChanges::default())
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));

    let created = repo.insert(&new_department("Legal", 3)).unwrap();
    let deleted = repo.soft_delete(created.id).unwrap();
    assert!(deleted.deleted_at.is_some());

    let err = repo.soft_delete(created.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
    let err = repo
        .apply_partial_update(created.id, &DepartmentChanges::default())
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn soft_delete_keeps_row_visible_only_with_include_deleted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();

    let kept = repo.insert(&new_department("Kept", 1)).unwrap();
    let retired = repo.insert(&new_department("Retired", 1)).unwrap();
    let tombstone = repo.soft_delete(retired.id).unwrap();
    assert_eq!(tombstone.name, "Retired");
    assert_eq!(tombstone.updated_at, retired.updated_at);

    assert!(repo.find_by_id(retired.id, false).unwrap().is_none());
    assert!(repo.find_by_id(retired.id, true).unwrap().is_some());

    let active = repo.find_all(&DepartmentQuery::active()).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, kept.id);

    let all = repo.find_all(&DepartmentQuery::including_deleted()).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn exists_respects_deleted_visibility_and_id_exclusion() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();

    let created = repo.insert(&new_department("Marketing", 5)).unwrap();
    let by_name = |query: DepartmentQuery| {
        query.and(Predicate::EqualsIgnoreCase {
            column: TextColumn::Name,
            value: "MARKETING".to_string(),
        })
    };

    assert!(repo.exists(&by_name(DepartmentQuery::active())).unwrap());
    assert!(!repo
        .exists(&by_name(DepartmentQuery::active()).and(Predicate::IdNot(created.id)))
        .unwrap());

    repo.soft_delete(created.id).unwrap();
    assert!(!repo.exists(&by_name(DepartmentQuery::active())).unwrap());
    assert!(repo
        .exists(&by_name(DepartmentQuery::including_deleted()))
        .unwrap());
}

#[test]
fn contains_predicate_matches_wildcards_literally() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();

    repo.insert(&new_department("Sales 100%", 1)).unwrap();
    repo.insert(&new_department("Sales 1000", 1)).unwrap();

    let query = DepartmentQuery::active().and(Predicate::Contains {
        column: TextColumn::Name,
        needle: "100%".to_string(),
    });
    let matches = repo.find_all(&query).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "Sales 100%");

    let query = DepartmentQuery::active().and(Predicate::Contains {
        column: TextColumn::Name,
        needle: "SALES".to_string(),
    });
    assert_eq!(repo.find_all(&query).unwrap().len(), 2);
}

#[test]
fn text_predicates_fold_non_ascii_case() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();

    let mut draft = new_department("Phòng Kế Toán", 2);
    draft.email = Some("KETOAN@CÔNGTY.VN".to_string());
    let created = repo.insert(&draft).unwrap();

    let by_name = DepartmentQuery::active().and(Predicate::EqualsIgnoreCase {
        column: TextColumn::Name,
        value: "PHÒNG KẾ TOÁN".to_string(),
    });
    assert!(repo.exists(&by_name).unwrap());

    let by_email = DepartmentQuery::active().and(Predicate::Contains {
        column: TextColumn::Email,
        needle: "côngty".to_string(),
    });
    let matches = repo.find_all(&by_email).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, created.id);
}

#[test]
fn find_all_orders_by_updated_at_then_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();

    let a = repo.insert(&new_department("A", 1)).unwrap();
    let b = repo.insert(&new_department("B", 1)).unwrap();
    let c = repo.insert(&new_department("C", 1)).unwrap();
    conn.execute("UPDATE departments SET updated_at = 5000;", [])
        .unwrap();
    conn.execute(
        "UPDATE departments SET updated_at = 9000 WHERE id = ?1;",
        [c.id.to_string()],
    )
    .unwrap();

    let listed = repo.find_all(&DepartmentQuery::active()).unwrap();
    let ids: Vec<_> = listed.iter().map(|department| department.id).collect();

    let mut tied = vec![a.id, b.id];
    tied.sort_by_key(|id| id.to_string());
    assert_eq!(ids, vec![c.id, tied[0], tied[1]]);
    assert_eq!(listed, repo.find_all(&DepartmentQuery::active()).unwrap());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteDepartmentRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_departments_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteDepartmentRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("departments"))
    ));
}

#[test]
fn corrupt_rows_are_reported_not_masked() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    conn.execute(
        "INSERT INTO departments (id, name, floor) VALUES ('not-a-uuid', 'Broken', 1);",
        [],
    )
    .unwrap();

    let err = repo.find_all(&DepartmentQuery::active()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
