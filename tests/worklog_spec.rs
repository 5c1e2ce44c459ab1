use bam::error::ValidationErrorKind;
use bam::models::{Pause, Session, TaskCategory, TaskState, Worklog};
use chrono::{Duration, TimeZone, Utc};
use speculate2::speculate;

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

speculate! {
    before {
        let mut worklog = Worklog::default();
        let analysis = worklog
            .add_task("Segmentation", TaskCategory::Development, None)
            .expect("create task");
        let meeting = worklog
            .add_task("Weekly sync", TaskCategory::Meeting, None)
            .expect("create task");
    }

    describe "punch in" {
        it "opens a session and derives the active state" {
            worklog.punch_in(analysis, t0()).expect("punch in");

            let task = worklog.task(analysis).unwrap();
            assert_eq!(task.state(), TaskState::Active);
            assert_eq!(task.sessions.len(), 1);
            assert!(task.sessions[0].is_open());
        }

        it "rejects a second punch-in anywhere in the manifest" {
            worklog.punch_in(analysis, t0()).expect("punch in");

            let err = worklog.punch_in(meeting, t0()).unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::Invariant);
            assert_eq!(worklog.task(meeting).unwrap().state(), TaskState::Idle);
        }

        it "rejects punching in a task that is already open" {
            worklog.punch_in(analysis, t0()).expect("punch in");
            let err = worklog.punch_in(analysis, t0()).unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::Invariant);
            assert_eq!(worklog.task(analysis).unwrap().sessions.len(), 1);
        }

        it "allows punching in again after the other task punched out" {
            worklog.punch_in(analysis, t0()).expect("punch in");
            worklog.punch_out(analysis, t0() + Duration::minutes(5)).expect("punch out");

            worklog.punch_in(meeting, t0() + Duration::minutes(6)).expect("punch in");
            assert_eq!(worklog.open_task().unwrap().id, meeting);
        }
    }

    describe "pause and resume" {
        it "pauses within the open session without closing it" {
            worklog.punch_in(analysis, t0()).expect("punch in");
            worklog.pause(analysis, t0() + Duration::minutes(10)).expect("pause");

            let task = worklog.task(analysis).unwrap();
            assert_eq!(task.state(), TaskState::Paused);
            assert_eq!(task.sessions.len(), 1);
            assert!(task.sessions[0].is_open());
        }

        it "resume closes the pause and keeps the same session" {
            worklog.punch_in(analysis, t0()).expect("punch in");
            worklog.pause(analysis, t0() + Duration::minutes(10)).expect("pause");
            worklog.resume(analysis, t0() + Duration::minutes(13)).expect("resume");

            let task = worklog.task(analysis).unwrap();
            assert_eq!(task.state(), TaskState::Active);
            assert_eq!(task.sessions.len(), 1);
            assert_eq!(task.sessions[0].pauses.len(), 1);
            assert!(task.sessions[0].pauses[0].end.is_some());
        }

        it "a paused task still blocks other punch-ins" {
            worklog.punch_in(analysis, t0()).expect("punch in");
            worklog.pause(analysis, t0() + Duration::minutes(10)).expect("pause");

            let err = worklog.punch_in(meeting, t0() + Duration::minutes(11)).unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::Invariant);
        }

        it "rejects pausing an idle task" {
            let err = worklog.pause(analysis, t0()).unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::Invariant);
        }

        it "rejects resuming a task that is not paused" {
            worklog.punch_in(analysis, t0()).expect("punch in");
            let err = worklog.resume(analysis, t0()).unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::Invariant);
        }
    }

    describe "punch out" {
        it "closes the session and any open pause" {
            worklog.punch_in(analysis, t0()).expect("punch in");
            worklog.pause(analysis, t0() + Duration::minutes(10)).expect("pause");
            worklog.punch_out(analysis, t0() + Duration::minutes(20)).expect("punch out");

            let task = worklog.task(analysis).unwrap();
            assert_eq!(task.state(), TaskState::Idle);
            let session = &task.sessions[0];
            assert!(!session.is_open());
            assert_eq!(session.pauses[0].end, session.punch_out);
        }

        it "each active period produces its own session" {
            worklog.punch_in(analysis, t0()).expect("punch in");
            worklog.punch_out(analysis, t0() + Duration::minutes(5)).expect("punch out");
            worklog.punch_in(analysis, t0() + Duration::minutes(30)).expect("punch in");
            worklog.punch_out(analysis, t0() + Duration::minutes(45)).expect("punch out");

            assert_eq!(worklog.task(analysis).unwrap().sessions.len(), 2);
        }

        it "rejects punching out an idle task" {
            let err = worklog.punch_out(analysis, t0()).unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::Invariant);
        }
    }

    describe "elapsed time" {
        it "subtracts pause intervals from the session span" {
            // Punched in at T0, paused at T0+10m for 3m, punched out at
            // T0+20m: 17 minutes of tracked work.
            let session = Session {
                punch_in: t0(),
                punch_out: Some(t0() + Duration::minutes(20)),
                pauses: vec![Pause {
                    start: t0() + Duration::minutes(10),
                    end: Some(t0() + Duration::minutes(13)),
                }],
                note: None,
            };
            assert_eq!(session.elapsed_at(t0() + Duration::minutes(25)), Duration::minutes(17));
        }

        it "measures an open pause up to now" {
            let session = Session {
                punch_in: t0(),
                punch_out: None,
                pauses: vec![Pause {
                    start: t0() + Duration::minutes(10),
                    end: None,
                }],
                note: None,
            };
            // 10 minutes active, paused ever since.
            assert_eq!(session.elapsed_at(t0() + Duration::minutes(40)), Duration::minutes(10));
        }

        it "sums sessions at the task level" {
            worklog.punch_in(analysis, t0()).expect("punch in");
            worklog.punch_out(analysis, t0() + Duration::minutes(5)).expect("punch out");
            worklog.punch_in(analysis, t0() + Duration::minutes(30)).expect("punch in");
            worklog.punch_out(analysis, t0() + Duration::minutes(42)).expect("punch out");

            let task = worklog.task(analysis).unwrap();
            assert_eq!(task.elapsed_at(t0() + Duration::hours(1)), Duration::minutes(17));
        }
    }

    describe "task hierarchy" {
        it "rejects a parent that does not exist" {
            let err = worklog
                .add_task("orphan", TaskCategory::Other, Some(uuid::Uuid::new_v4()))
                .unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::Referential);
        }

        it "deleting a leaf removes exactly one record" {
            let removed = worklog.delete_task(meeting, false).expect("delete leaf");
            assert_eq!(removed, 1);
            assert_eq!(worklog.tasks.len(), 1);
        }

        it "deleting a task with two descendants removes all three" {
            let child = worklog
                .add_task("Tune thresholds", TaskCategory::Execution, Some(analysis))
                .expect("create child");
            worklog
                .add_task("Grid search", TaskCategory::Execution, Some(child))
                .expect("create grandchild");

            let removed = worklog.delete_task(analysis, true).expect("cascade");
            assert_eq!(removed, 3);
            assert!(worklog.task(analysis).is_none());
            assert!(worklog.task(child).is_none());
        }

        it "refuses to delete a non-leaf without cascade" {
            worklog
                .add_task("Tune thresholds", TaskCategory::Execution, Some(analysis))
                .expect("create child");

            let err = worklog.delete_task(analysis, false).unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::Invariant);
            assert_eq!(worklog.tasks.len(), 3);
        }
    }

    describe "completion" {
        it "completing an open task punches it out first" {
            worklog.punch_in(analysis, t0()).expect("punch in");
            worklog.complete_task(analysis, t0() + Duration::minutes(15)).expect("complete");

            let task = worklog.task(analysis).unwrap();
            assert!(task.completed);
            assert_eq!(task.state(), TaskState::Idle);
            assert!(worklog.open_task().is_none());
        }

        it "a reopened task can punch in again" {
            worklog.complete_task(analysis, t0()).expect("complete");
            worklog.reopen_task(analysis).expect("reopen");
            worklog.punch_in(analysis, t0() + Duration::minutes(1)).expect("punch in");
            assert_eq!(worklog.task(analysis).unwrap().state(), TaskState::Active);
        }
    }
}
