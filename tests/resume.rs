// Resume: rebuilding the session position from a previous run's table.

mod common;

use cell_annotator::{Session, SessionError, TableError};
use common::{fixture, label};

#[test]
fn partial_table_resumes_at_first_unlabelled_cell() {
    let fx = fixture("ivan", 5);
    fx.write_table("ivan", &[(0, 1), (1, 3)]);

    let session = Session::initialize("ivan", &fx.config).unwrap();
    let view = session.view();
    assert_eq!(view.cursor, 2);
    assert_eq!(view.image, Some(2));
    assert_eq!(view.heading(), "Cell #3");
    assert!(view.can_retreat);
    assert_eq!(view.counts.get(label(3)), 1);
}

#[test]
fn complete_table_reopens_on_last_cell() {
    let fx = fixture("judy", 3);
    fx.write_table("judy", &[(0, 1), (1, 1), (2, 4)]);

    let session = Session::initialize("judy", &fx.config).unwrap();
    assert_eq!(session.cursor(), 2);
    assert!(!session.is_complete());
    assert_eq!(session.view().image, Some(2));
}

#[test]
fn relabel_last_cell_after_resuming_complete_table() {
    let fx = fixture("mallory", 3);
    fx.write_table("mallory", &[(0, 1), (1, 1), (2, 4)]);
    let mut session = Session::initialize("mallory", &fx.config).unwrap();

    session.set_pending_label(label(6));
    let view = session.advance().unwrap();
    assert!(view.is_complete());
    assert_eq!(session.table().len(), 3);
    assert_eq!(
        fx.read_table("mallory").unwrap(),
        "CellID,ClassID\n0,1\n1,1\n2,6\n"
    );
}

#[test]
fn previous_after_complete_resume_drops_last_row() {
    let fx = fixture("niaj", 3);
    fx.write_table("niaj", &[(0, 1), (1, 2), (2, 4)]);
    let mut session = Session::initialize("niaj", &fx.config).unwrap();

    let view = session.retreat();
    assert_eq!(view.cursor, 1);
    assert_eq!(session.table().len(), 2);
    assert_eq!(session.table().label_of(2), None);
    assert_eq!(session.table().label_of(1), Some(label(2)));

    // relabelling cell 1 overwrites its row, then cell 2 is appended
    session.set_pending_label(label(0));
    session.advance().unwrap();
    session.set_pending_label(label(5));
    let view = session.advance().unwrap();
    assert!(view.is_complete());
    assert_eq!(
        fx.read_table("niaj").unwrap(),
        "CellID,ClassID\n0,1\n1,0\n2,5\n"
    );
}

#[test]
fn empty_table_resumes_at_start_with_previous_enabled() {
    let fx = fixture("olivia", 2);
    fx.write_table("olivia", &[]);

    let mut session = Session::initialize("olivia", &fx.config).unwrap();
    assert_eq!(session.cursor(), 0);
    assert!(session.view().can_retreat);
    assert!(!session.retreat().can_retreat);
}

#[test]
fn resumed_progress_survives_restart() {
    let fx = fixture("peggy", 4);
    {
        let mut session = Session::initialize("peggy", &fx.config).unwrap();
        for id in [0, 1] {
            session.set_pending_label(label(id));
            session.advance().unwrap();
        }
    }

    let session = Session::initialize("peggy", &fx.config).unwrap();
    assert_eq!(session.cursor(), 2);
    assert_eq!(session.table().label_of(1), Some(label(1)));
}

#[test]
fn corrupt_table_is_fatal() {
    let fx = fixture("rupert", 3);

    fx.write_table("rupert", &[(0, 1), (0, 2)]);
    assert!(matches!(
        Session::initialize("rupert", &fx.config),
        Err(SessionError::Table(TableError::DuplicateCell { cell: 0 }))
    ));

    fx.write_table("rupert", &[(7, 1)]);
    assert!(matches!(
        Session::initialize("rupert", &fx.config),
        Err(SessionError::Table(TableError::CellOutOfRange { cell: 7, len: 3 }))
    ));

    fx.write_table("rupert", &[(0, 12)]);
    assert!(matches!(
        Session::initialize("rupert", &fx.config),
        Err(SessionError::Table(TableError::UnknownLabel { .. }))
    ));
}
