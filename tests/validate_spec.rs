use bam::error::ValidationErrorKind;
use bam::models::{Artifact, ArtifactKind, ArtifactStatus, Manifest, TaskCategory};
use bam::validate::validate;
use speculate2::speculate;

fn parse(yaml: &str) -> serde_yaml::Value {
    serde_yaml::from_str(yaml).expect("fixture parses as YAML")
}

const VALID: &str = r#"
project:
  name: spheroid-screen
  created: 2026-03-01
analyst: Jane Doe
tags:
  - imaging
  - 3d
artifacts:
  fig1:
    path: figures/fig1.pdf
    kind: figure
    status: draft
    figure:
      - id: fig1
        title: Experimental setup
        children:
          - id: 1a
            source: scripts/plot_results.py
            status: ready
          - id: 1b
worklog:
  tasks:
    - id: 7c9e6679-7425-40de-944b-e07fc1f90ae7
      name: Segmentation
      category: development
      created: 2026-03-02T09:00:00Z
      sessions:
        - punch_in: 2026-03-02T09:00:00Z
          punch_out: 2026-03-02T10:30:00Z
"#;

speculate! {
    describe "structural checks" {
        it "accepts a complete valid manifest" {
            let manifest = validate(&parse(VALID)).expect("valid manifest");
            assert_eq!(manifest.project.name, "spheroid-screen");
            assert_eq!(manifest.artifacts.len(), 1);
            assert_eq!(manifest.worklog.tasks.len(), 1);
        }

        it "reports a missing required field by name" {
            let errors = validate(&parse("project:\n  status: active\n")).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].path, "project.name");
            assert_eq!(errors[0].kind, ValidationErrorKind::Structural);
        }

        it "rejects a non-mapping document root" {
            let errors = validate(&parse("- just\n- a\n- list\n")).unwrap_err();
            assert_eq!(errors[0].path, "manifest");
            assert_eq!(errors[0].kind, ValidationErrorKind::Structural);
        }

        it "rejects unknown enumeration values with their path" {
            let yaml = r#"
project:
  name: p
artifacts:
  t1:
    path: tables/t1.csv
    kind: spreadsheet
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].path, "artifacts.t1.kind");
        }

        it "collects every structural error in one pass" {
            let yaml = r#"
project:
  status: active
artifacts:
  fig1:
    kind: figure
worklog:
  tasks:
    - name: orphan
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
            assert!(paths.contains(&"project.name"));
            assert!(paths.contains(&"artifacts.fig1.path"));
            assert!(paths.contains(&"worklog.tasks[0].id"));
            assert!(errors.len() >= 3);
        }

        it "rejects timestamps that do not parse" {
            let yaml = r#"
project:
  name: p
worklog:
  tasks:
    - id: 7c9e6679-7425-40de-944b-e07fc1f90ae7
      name: t
      sessions:
        - punch_in: yesterday
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            assert_eq!(errors[0].path, "worklog.tasks[0].sessions[0].punch_in");
            assert_eq!(errors[0].kind, ValidationErrorKind::Structural);
        }
    }

    describe "referential checks" {
        it "rejects a parent reference to an unknown task" {
            let yaml = r#"
project:
  name: p
worklog:
  tasks:
    - id: 7c9e6679-7425-40de-944b-e07fc1f90ae7
      name: child
      parent: 16fd2706-8baf-433b-82eb-8c7fada847da
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            assert_eq!(errors[0].path, "worklog.tasks[0].parent");
            assert_eq!(errors[0].kind, ValidationErrorKind::Referential);
        }

        it "rejects a cyclic task-parent chain and never yields a manifest" {
            let yaml = r#"
project:
  name: p
worklog:
  tasks:
    - id: 7c9e6679-7425-40de-944b-e07fc1f90ae7
      name: a
      parent: 16fd2706-8baf-433b-82eb-8c7fada847da
    - id: 16fd2706-8baf-433b-82eb-8c7fada847da
      name: b
      parent: 7c9e6679-7425-40de-944b-e07fc1f90ae7
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            assert!(errors
                .iter()
                .any(|e| e.kind == ValidationErrorKind::Referential
                    && e.message.contains("cyclic")));
        }

        it "rejects duplicate figure element ids among siblings" {
            let yaml = r#"
project:
  name: p
artifacts:
  fig1:
    path: figures/fig1.pdf
    kind: figure
    figure:
      - id: fig1
        children:
          - id: 1a
          - id: 1a
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].kind, ValidationErrorKind::Referential);
            assert!(errors[0].path.starts_with("artifacts.fig1.figure"));
        }

        it "rejects duplicate task ids" {
            let yaml = r#"
project:
  name: p
worklog:
  tasks:
    - id: 7c9e6679-7425-40de-944b-e07fc1f90ae7
      name: a
    - id: 7c9e6679-7425-40de-944b-e07fc1f90ae7
      name: b
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            assert_eq!(errors[0].kind, ValidationErrorKind::Referential);
            assert_eq!(errors[0].path, "worklog.tasks[1].id");
        }
    }

    describe "worklog invariants" {
        it "rejects two globally open sessions" {
            let yaml = r#"
project:
  name: p
worklog:
  tasks:
    - id: 7c9e6679-7425-40de-944b-e07fc1f90ae7
      name: a
      sessions:
        - punch_in: 2026-03-02T09:00:00Z
    - id: 16fd2706-8baf-433b-82eb-8c7fada847da
      name: b
      sessions:
        - punch_in: 2026-03-02T09:05:00Z
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].kind, ValidationErrorKind::Invariant);
            assert_eq!(errors[0].path, "worklog.tasks[1].sessions[0]");
        }

        it "rejects a session that ends before it starts" {
            let yaml = r#"
project:
  name: p
worklog:
  tasks:
    - id: 7c9e6679-7425-40de-944b-e07fc1f90ae7
      name: a
      sessions:
        - punch_in: 2026-03-02T10:00:00Z
          punch_out: 2026-03-02T09:00:00Z
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            assert_eq!(errors[0].kind, ValidationErrorKind::Invariant);
            assert!(errors[0].path.ends_with("punch_out"));
        }

        it "rejects an open pause in a closed session" {
            let yaml = r#"
project:
  name: p
worklog:
  tasks:
    - id: 7c9e6679-7425-40de-944b-e07fc1f90ae7
      name: a
      sessions:
        - punch_in: 2026-03-02T09:00:00Z
          punch_out: 2026-03-02T10:00:00Z
          pauses:
            - start: 2026-03-02T09:30:00Z
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            assert!(errors
                .iter()
                .any(|e| e.kind == ValidationErrorKind::Invariant
                    && e.message.contains("open pause")));
        }
    }

    describe "schema cross-field rules" {
        it "rejects a status outside the kind's allowed set" {
            let yaml = r#"
project:
  name: p
artifacts:
  pipeline:
    path: scripts/run.py
    kind: script
    status: published
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].kind, ValidationErrorKind::Invariant);
            assert_eq!(errors[0].path, "artifacts.pipeline.status");
        }

        it "rejects a figure tree on a non-figure artifact" {
            let yaml = r#"
project:
  name: p
artifacts:
  raw:
    path: data/raw.zarr
    kind: dataset
    figure:
      - id: stray
"#;
            let errors = validate(&parse(yaml)).unwrap_err();
            assert_eq!(errors[0].kind, ValidationErrorKind::Invariant);
            assert_eq!(errors[0].path, "artifacts.raw.figure");
        }
    }

    describe "round trip" {
        it "accepts the serialized form of any valid in-memory manifest" {
            let mut manifest = Manifest::template("roundtrip", Some("Jane"));
            manifest.tags = vec!["imaging".to_string()];
            manifest.artifacts.insert(
                "fig1".to_string(),
                Artifact::new("figures/fig1.pdf", ArtifactKind::Figure),
            );
            manifest.artifacts.insert(
                "table1".to_string(),
                {
                    let mut a = Artifact::new("tables/stats.csv", ArtifactKind::Table);
                    a.status = ArtifactStatus::Ready;
                    a
                },
            );
            let segmentation = manifest
                .worklog
                .add_task("Segmentation", TaskCategory::Development, None)
                .unwrap();
            manifest
                .worklog
                .add_task("Tune thresholds", TaskCategory::Execution, Some(segmentation))
                .unwrap();

            let text = serde_yaml::to_string(&manifest).unwrap();
            let raw: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
            let reloaded = validate(&raw).expect("serialized manifest validates");
            assert_eq!(reloaded.project.name, "roundtrip");
            assert_eq!(reloaded.artifacts.len(), 2);
            assert_eq!(reloaded.worklog.tasks.len(), 2);
        }
    }
}
