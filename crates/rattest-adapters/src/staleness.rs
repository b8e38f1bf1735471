//! Timestamp-based freshness checks.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// True when `target` is missing or any source was modified after it.
///
/// Sources that do not exist are ignored.
pub fn needs_update<P: AsRef<Path>>(target: &Path, sources: &[P]) -> bool {
    let Some(target_time) = mtime(target) else {
        return true;
    };

    sources
        .iter()
        .filter_map(|s| mtime(s.as_ref()))
        .any(|source_time| source_time > target_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs::File;
    use std::path::PathBuf;
    use std::time::Duration;

    fn touch(path: &Path, at: SystemTime) {
        let f = File::options()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .unwrap();
        f.set_modified(at).unwrap();
    }

    fn epoch_plus(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + secs)
    }

    #[test]
    fn missing_target_needs_update() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("events.root");
        assert!(needs_update::<PathBuf>(&target, &[]));
    }

    #[test]
    fn newer_source_makes_target_stale() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("current.json");
        let source = dir.path().join("events.root");
        touch(&target, epoch_plus(10));
        touch(&source, epoch_plus(20));
        assert!(needs_update(&target, &[&source]));
    }

    #[test]
    fn equal_mtime_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("current.json");
        let source = dir.path().join("events.root");
        touch(&target, epoch_plus(10));
        touch(&source, epoch_plus(10));
        assert!(!needs_update(&target, &[&source]));
    }

    #[test]
    fn missing_sources_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("current.json");
        touch(&target, epoch_plus(10));
        assert!(!needs_update(&target, &[dir.path().join("nope.C")]));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// An existing target is fresh iff no source is strictly newer.
        #[test]
        fn stale_iff_some_source_is_newer(
            target_offset in 0u64..1000,
            source_offsets in proptest::collection::vec(0u64..1000, 0..6),
        ) {
            let dir = tempfile::tempdir().unwrap();
            let target = dir.path().join("target");
            touch(&target, epoch_plus(target_offset));

            let sources: Vec<PathBuf> = source_offsets
                .iter()
                .enumerate()
                .map(|(i, off)| {
                    let p = dir.path().join(format!("source{i}"));
                    touch(&p, epoch_plus(*off));
                    p
                })
                .collect();

            let expected = source_offsets.iter().any(|off| *off > target_offset);
            prop_assert_eq!(needs_update(&target, &sources), expected);
        }
    }
}
