//! End-to-end tests for the receive run over a mirrored endpoint

mod common;

use std::fs;

use common::{FlakyConnector, RecordingImporter, T0, load, run_time, utc};
use nsc_core::{
    AuditLog, AuditStatus, DirectoryConnector, Error, FileStatus, ImportStatus, MARKER_FILE_NAME,
    MarkerFile, ReceiveEngine, SyncOptions, WatermarkStore,
};
use nsc_fs::LOCK_FILE_NAME;
use nsc_test_utils::TestSite;

const DETAIL: &str = "00112233_000001_DETLRPT_SE_08152024101500_fall2024_submitted.csv";
const AGGREGATE: &str = "00112233_000002_AGGRRPT_SE_08152024101500_fall2024_submitted.csv";

const RULES: &str = r#"
nsc:
  rename:
    term_report:
      mode: SE
      pattern: '(?P<term>\w{5,7})_(?P<submitted>.*)'
      replace: '{term}_{nsctype}_{nscmode}_{submitted}.{ext}'
      import: true
  import:
    type: DETLRPT
    cmd: python nsc_import_db.py
"#;

fn marker(site: &TestSite) -> MarkerFile {
    MarkerFile::in_dir(&site.receive_dir())
}

mod batch {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_run_downloads_everything_and_commits_max_mtime() {
        let site = TestSite::new();
        site.add_remote_file("b.txt", "bee", T0 + 20);
        site.add_remote_file("a.txt", "ay", T0 + 10);
        let (config, catalog) = load(&site);
        let mut store = marker(&site);

        let report = ReceiveEngine::new(&config.nsc, &catalog)
            .with_run_time(run_time())
            .run(&DirectoryConnector::new(), &mut store)
            .unwrap();

        assert_eq!(report.listed, 2);
        assert_eq!(report.count(FileStatus::Downloaded), 2);
        assert_eq!(report.previous_watermark, None);
        assert_eq!(report.new_watermark, Some(utc(T0 + 20)));
        assert_eq!(store.read().unwrap(), Some(utc(T0 + 20)));

        assert_eq!(
            fs::read_to_string(site.receive_dir().join("a.txt")).unwrap(),
            "ay"
        );
        let stamped = nsc_fs::io::modified_time(&site.receive_dir().join("b.txt")).unwrap();
        assert_eq!(stamped, utc(T0 + 20));
        assert!(report.files.iter().all(|f| f.timestamp_preserved));
    }

    #[test]
    fn audit_log_gets_header_once_and_one_row_per_download() {
        let site = TestSite::new();
        site.add_remote_file("a.txt", "ay", T0);
        let (config, catalog) = load(&site);
        let engine = ReceiveEngine::new(&config.nsc, &catalog).with_run_time(run_time());

        engine
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();
        site.add_remote_file("b.txt", "bee", T0 + 60);
        engine
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        let lines = site.log_lines();
        assert_eq!(
            lines[0],
            "nsc_file_name,local_file_name,file_date_time,status,date_time"
        );
        assert_eq!(lines.len(), 3);

        let records = AuditLog::read(&site.log_file()).unwrap();
        assert_eq!(records[0].remote_name, "a.txt");
        assert_eq!(records[1].remote_name, "b.txt");
        assert!(records.iter().all(|r| r.status == AuditStatus::Downloaded));
        assert_eq!(records[0].recorded_at, run_time().naive_local());
    }

    #[test]
    fn rerun_without_remote_changes_is_a_no_op() {
        let site = TestSite::new();
        site.add_remote_file("a.txt", "ay", T0);
        let (config, catalog) = load(&site);
        let engine = ReceiveEngine::new(&config.nsc, &catalog);

        engine
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();
        let log_before = site.log_lines();

        let second = engine
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        assert!(second.files.is_empty());
        assert_eq!(second.new_watermark, None);
        assert_eq!(site.log_lines(), log_before);
        assert_eq!(marker(&site).read().unwrap(), Some(utc(T0)));
    }

    #[test]
    fn only_entries_newer_than_watermark_are_retained() {
        let site = TestSite::new();
        site.add_remote_file("seen.txt", "1", T0);
        let (config, catalog) = load(&site);
        let engine = ReceiveEngine::new(&config.nsc, &catalog);
        engine
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        site.add_remote_file("late_but_old.txt", "2", T0 - 3600);
        site.add_remote_file("equal.txt", "3", T0);
        site.add_remote_file("new.txt", "4", T0 + 1);

        let report = engine
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        let names: Vec<_> = report.files.iter().map(|f| f.remote_name.as_str()).collect();
        assert_eq!(names, vec!["new.txt"]);
        assert_eq!(report.listed, 4);
        assert_eq!(report.new_watermark, Some(utc(T0 + 1)));
        site.assert_file_not_exists("local/receive/late_but_old.txt");
    }

    #[test]
    fn watermark_never_moves_backwards() {
        let site = TestSite::new();
        site.add_remote_file("a.txt", "1", T0);
        let (config, catalog) = load(&site);
        let mut store = marker(&site);
        store.write(utc(T0 + 1000)).unwrap();

        let report = ReceiveEngine::new(&config.nsc, &catalog)
            .run(&DirectoryConnector::new(), &mut store)
            .unwrap();

        assert!(report.files.is_empty());
        assert_eq!(store.read().unwrap(), Some(utc(T0 + 1000)));
    }

    #[test]
    fn dry_run_resolves_without_side_effects() {
        let site = TestSite::new();
        site.write_overlay(RULES);
        site.add_remote_file(DETAIL, "x", T0);
        let (config, catalog) = load(&site);
        let importer = RecordingImporter::default();

        let report = ReceiveEngine::new(&config.nsc, &catalog)
            .with_importer(&importer)
            .with_options(SyncOptions { dry_run: true })
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.count(FileStatus::Planned), 1);
        assert_eq!(report.files[0].local_name, "all2024_DETLRPT_SE_submitted.csv");
        assert_eq!(report.files[0].import, ImportStatus::Planned);
        assert_eq!(report.new_watermark, None);
        assert!(importer.calls.borrow().is_empty());
        assert!(site.log_lines().is_empty());
        assert_eq!(marker(&site).read().unwrap(), None);
        assert!(site.file_names(&site.receive_dir()).is_empty());
    }
}

mod naming {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unstructured_and_unmatched_names_keep_remote_name() {
        let site = TestSite::new();
        site.write_overlay(RULES);
        site.add_remote_file("README.txt", "r", T0);
        site.add_remote_file(
            "00112233_000003_DETLRPT_CE_08152024101500_fall2024_submitted.csv",
            "c",
            T0 + 1,
        );
        let (config, catalog) = load(&site);

        let report = ReceiveEngine::new(&config.nsc, &catalog)
            .with_importer(&RecordingImporter::default())
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        for file in &report.files {
            assert_eq!(file.local_name, file.remote_name);
            assert_eq!(file.rule, None);
            assert_eq!(file.import, ImportStatus::NotRequested);
        }
        assert!(!report.files.iter().find(|f| f.remote_name == "README.txt").unwrap().structured);
    }

    #[test]
    fn matching_rule_renames_the_local_copy() {
        let site = TestSite::new();
        site.write_overlay(RULES);
        site.add_remote_file(AGGREGATE, "agg", T0);
        let (config, catalog) = load(&site);

        let report = ReceiveEngine::new(&config.nsc, &catalog)
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        assert_eq!(report.files[0].rule.as_deref(), Some("term_report"));
        assert_eq!(
            site.file_names(&site.receive_dir()),
            vec![MARKER_FILE_NAME, "all2024_AGGRRPT_SE_submitted.csv"]
        );
        let records = AuditLog::read(&site.log_file()).unwrap();
        assert_eq!(records[0].remote_name, AGGREGATE);
        assert!(records[0].local_path.ends_with("all2024_AGGRRPT_SE_submitted.csv"));
    }

    #[test]
    fn escaping_local_name_is_skipped_but_still_advances_watermark() {
        let site = TestSite::new();
        site.write_overlay(
            r#"
nsc:
  rename:
    escape:
      replace: '../{filename}'
"#,
        );
        site.add_remote_file(DETAIL, "x", T0);
        let (config, catalog) = load(&site);

        let report = ReceiveEngine::new(&config.nsc, &catalog)
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        assert_eq!(report.files[0].status, FileStatus::Skipped);
        assert!(report.files[0].error.is_some());
        assert_eq!(report.new_watermark, Some(utc(T0)));
        assert!(!site.root().join("local").join(DETAIL).exists());
        assert_eq!(site.log_lines().len(), 1);
    }

    #[test]
    fn remote_file_named_like_the_run_lock_is_skipped() {
        let site = TestSite::new();
        site.add_remote_file(LOCK_FILE_NAME, "not a lock", T0);
        site.add_remote_file("a.txt", "ay", T0 + 1);
        let (config, catalog) = load(&site);

        let report = ReceiveEngine::new(&config.nsc, &catalog)
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        let lock = report
            .files
            .iter()
            .find(|f| f.remote_name == LOCK_FILE_NAME)
            .unwrap();
        assert_eq!(lock.status, FileStatus::Skipped);
        assert!(lock.error.is_some());
        assert!(!site.receive_dir().join(LOCK_FILE_NAME).exists());
        assert_eq!(report.count(FileStatus::Downloaded), 1);
        assert_eq!(report.new_watermark, Some(utc(T0 + 1)));
    }
}

mod import {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn importable_type_is_dispatched_and_logged() {
        let site = TestSite::new();
        site.write_overlay(RULES);
        site.add_remote_file(DETAIL, "d", T0);
        site.add_remote_file(AGGREGATE, "a", T0 + 1);
        let (config, catalog) = load(&site);
        let importer = RecordingImporter::default();

        let report = ReceiveEngine::new(&config.nsc, &catalog)
            .with_importer(&importer)
            .with_run_time(run_time())
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        assert_eq!(report.imported(), 1);
        let calls = importer.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (entry, file, stamp) = &calls[0];
        assert_eq!(entry, "term_report");
        assert_eq!(
            file,
            &site.receive_dir().join("all2024_DETLRPT_SE_submitted.csv")
        );
        assert_eq!(stamp, "20240815_101500");

        let statuses: Vec<_> = AuditLog::read(&site.log_file())
            .unwrap()
            .into_iter()
            .map(|r| (r.remote_name, r.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                (DETAIL.to_string(), AuditStatus::Downloaded),
                (DETAIL.to_string(), AuditStatus::Imported),
                (AGGREGATE.to_string(), AuditStatus::Downloaded),
            ]
        );
    }

    #[test]
    fn failed_import_does_not_block_the_batch() {
        let site = TestSite::new();
        site.write_overlay(RULES);
        site.add_remote_file(DETAIL, "d", T0);
        let (config, catalog) = load(&site);
        let importer = RecordingImporter::failing();

        let report = ReceiveEngine::new(&config.nsc, &catalog)
            .with_importer(&importer)
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        assert_eq!(report.files[0].status, FileStatus::Downloaded);
        assert_eq!(report.import_failures(), 1);
        assert_eq!(report.new_watermark, Some(utc(T0)));
        let records = AuditLog::read(&site.log_file()).unwrap();
        assert!(records.iter().all(|r| r.status != AuditStatus::Imported));
    }

    #[test]
    fn import_requested_without_importer_is_reported_failed() {
        let site = TestSite::new();
        site.write_overlay(RULES);
        site.add_remote_file(DETAIL, "d", T0);
        let (config, catalog) = load(&site);

        let report = ReceiveEngine::new(&config.nsc, &catalog)
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();

        assert!(matches!(report.files[0].import, ImportStatus::Failed { .. }));
    }

    #[test]
    fn retry_after_failed_transfer_does_not_import_twice() {
        let site = TestSite::new();
        site.write_overlay(RULES);
        site.add_remote_file("a.txt", "1", T0);
        site.add_remote_file(DETAIL, "d", T0 + 10);
        let (config, catalog) = load(&site);
        let importer = RecordingImporter::default();
        let engine = ReceiveEngine::new(&config.nsc, &catalog).with_importer(&importer);

        let flaky = FlakyConnector::new(&site.remote_root(), &["a.txt"]);
        let first = engine.run(&flaky, &mut marker(&site)).unwrap();
        assert_eq!(first.imported(), 1);
        assert_eq!(first.new_watermark, None);

        let planned = ReceiveEngine::new(&config.nsc, &catalog)
            .with_importer(&importer)
            .with_options(SyncOptions { dry_run: true })
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();
        let detail = planned.files.iter().find(|f| f.remote_name == DETAIL).unwrap();
        assert_eq!(detail.import, ImportStatus::AlreadyImported);

        let second = engine
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();
        let detail = second.files.iter().find(|f| f.remote_name == DETAIL).unwrap();
        assert_eq!(detail.status, FileStatus::Downloaded);
        assert_eq!(detail.import, ImportStatus::AlreadyImported);
        assert_eq!(second.imported(), 0);
        assert_eq!(second.new_watermark, Some(utc(T0 + 10)));

        assert_eq!(importer.calls.borrow().len(), 1);
        let imported_rows = AuditLog::read(&site.log_file())
            .unwrap()
            .into_iter()
            .filter(|r| r.status == AuditStatus::Imported)
            .count();
        assert_eq!(imported_rows, 1);
    }
}

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn failed_transfer_caps_watermark_and_is_retried() {
        let site = TestSite::new();
        site.add_remote_file("a.txt", "1", T0);
        site.add_remote_file("b.txt", "2", T0 + 10);
        site.add_remote_file("c.txt", "3", T0 + 20);
        let (config, catalog) = load(&site);
        let engine = ReceiveEngine::new(&config.nsc, &catalog);

        let flaky = FlakyConnector::new(&site.remote_root(), &["b.txt"]);
        let first = engine.run(&flaky, &mut marker(&site)).unwrap();

        assert_eq!(first.count(FileStatus::Downloaded), 2);
        assert_eq!(first.count(FileStatus::TransferFailed), 1);
        assert_eq!(first.new_watermark, Some(utc(T0)));
        site.assert_file_not_exists("local/receive/b.txt");

        let second = engine
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap();
        let retried: Vec<_> = second.files.iter().map(|f| f.remote_name.as_str()).collect();
        assert!(retried.contains(&"b.txt"));
        assert!(!retried.contains(&"a.txt"));
        assert_eq!(second.new_watermark, Some(utc(T0 + 20)));
        site.assert_file_exists("local/receive/b.txt");
    }

    #[test]
    fn missing_transport_fails_before_anything_changes() {
        let site = TestSite::new();
        site.add_remote_file("a.txt", "1", T0);
        let (mut config, catalog) = load(&site);
        config.nsc.ftp.mount = None;

        let err = ReceiveEngine::new(&config.nsc, &catalog)
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap_err();

        assert!(matches!(err, Error::Connection { .. }));
        assert!(err.is_fatal());
        assert_eq!(marker(&site).read().unwrap(), None);
        assert!(site.log_lines().is_empty());
    }

    #[test]
    fn unlistable_remote_directory_aborts_the_run() {
        let site = TestSite::new();
        let (mut config, catalog) = load(&site);
        config.nsc.ftp.receive_path = "/does-not-exist".into();

        let err = ReceiveEngine::new(&config.nsc, &catalog)
            .run(&DirectoryConnector::new(), &mut marker(&site))
            .unwrap_err();

        assert!(matches!(err, Error::List { .. }));
        assert_eq!(marker(&site).read().unwrap(), None);
    }

    #[test]
    fn lost_connection_mid_batch_aborts_without_moving_watermark() {
        let site = TestSite::new();
        site.add_remote_file("a.txt", "1", T0);
        site.add_remote_file("b.txt", "2", T0 + 10);
        let (config, catalog) = load(&site);

        let dropping = FlakyConnector::dropping(&site.remote_root(), &["b.txt"]);
        let err = ReceiveEngine::new(&config.nsc, &catalog)
            .run(&dropping, &mut marker(&site))
            .unwrap_err();

        assert!(matches!(err, Error::Connection { .. }));
        assert_eq!(marker(&site).read().unwrap(), None);
    }
}
