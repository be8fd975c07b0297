use crate::config::{MediaKind, classify};
use anyhow::{Context, Result};
use clap::ValueEnum;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// 候選檔案
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MediaFilter {
    #[value(alias = "image")]
    Images,
    #[value(alias = "video")]
    Videos,
    #[default]
    #[value(alias = "all")]
    Both,
}

impl MediaFilter {
    #[must_use]
    pub const fn passes(self, kind: MediaKind) -> bool {
        match self {
            Self::Images => matches!(kind, MediaKind::Image),
            Self::Videos => matches!(kind, MediaKind::Video),
            Self::Both => kind.is_media(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortKey {
    Name,
    #[default]
    Mtime,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// 掃描目錄下所有符合過濾條件的媒體檔案（略過快取資料夾本身）
///
/// 走訪時遇到任何錯誤（無法讀取的資料夾等）即中止並回傳該錯誤。
pub fn scan_media(root: &Path, cache_dir: &Path, filter: MediaFilter) -> Result<Vec<Candidate>> {
    let cache_abs = absolute(cache_dir);

    let entries = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && absolute(entry.path()) == cache_abs))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("無法掃描 {}", root.display()))?;

    let candidates = entries
        .into_par_iter()
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let kind = classify(entry.path());
            if !filter.passes(kind) {
                return None;
            }
            let metadata = entry.metadata().ok()?;
            Some(Candidate {
                name: entry.file_name().to_string_lossy().to_string(),
                path: entry.into_path(),
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                kind,
            })
        })
        .collect();

    Ok(candidates)
}

pub fn sort_candidates(candidates: &mut [Candidate], key: SortKey, order: SortOrder) {
    match key {
        SortKey::Name => candidates.sort_by_cached_key(|c| c.name.to_lowercase()),
        SortKey::Mtime => candidates.sort_by_key(|c| c.modified),
        SortKey::Size => candidates.sort_by_key(|c| c.size),
    }
    if order == SortOrder::Desc {
        candidates.reverse();
    }
}

/// 轉為絕對路徑，失敗時原樣返回
#[must_use]
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn candidate(name: &str, size: u64, age_secs: u64) -> Candidate {
        Candidate {
            path: PathBuf::from(format!("/m/{name}")),
            name: name.to_string(),
            size,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 - age_secs),
            kind: classify(Path::new(name)),
        }
    }

    #[test]
    fn test_scan_filters_and_skips_cache() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let cache = root.join(".cache");
        fs::create_dir_all(&cache).unwrap();
        fs::create_dir_all(root.join("sub")).unwrap();

        fs::write(root.join("a.jpg"), b"img").unwrap();
        fs::write(root.join("sub").join("b.MP4"), b"vid").unwrap();
        fs::write(root.join("notes.txt"), b"txt").unwrap();
        fs::write(cache.join("cached.png"), b"png").unwrap();

        let mut both = scan_media(root, &cache, MediaFilter::Both).unwrap();
        sort_candidates(&mut both, SortKey::Name, SortOrder::Asc);
        let names: Vec<_> = both.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.MP4"]);

        let videos = scan_media(root, &cache, MediaFilter::Videos).unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].kind, MediaKind::Video);

        let images = scan_media(root, &cache, MediaFilter::Images).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].size, 3);
    }

    #[test]
    fn test_scan_error_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone");

        let err = scan_media(&missing, &temp_dir.path().join(".cache"), MediaFilter::Both)
            .unwrap_err();
        assert!(err.to_string().contains("無法掃描"));
        assert!(err.downcast_ref::<walkdir::Error>().is_some());
    }

    #[test]
    fn test_sort_by_name_case_insensitive() {
        let mut files = vec![candidate("b.jpg", 1, 0), candidate("A.jpg", 1, 0), candidate("c.png", 1, 0)];
        sort_candidates(&mut files, SortKey::Name, SortOrder::Asc);
        assert_eq!(files[0].name, "A.jpg");
        assert_eq!(files[2].name, "c.png");

        sort_candidates(&mut files, SortKey::Name, SortOrder::Desc);
        assert_eq!(files[0].name, "c.png");
    }

    #[test]
    fn test_sort_by_mtime_and_size() {
        let mut files = vec![
            candidate("old.jpg", 300, 500),
            candidate("new.jpg", 100, 10),
            candidate("mid.jpg", 200, 100),
        ];

        sort_candidates(&mut files, SortKey::Mtime, SortOrder::Desc);
        assert_eq!(files[0].name, "new.jpg");
        assert_eq!(files[2].name, "old.jpg");

        sort_candidates(&mut files, SortKey::Size, SortOrder::Asc);
        assert_eq!(files[0].size, 100);
        assert_eq!(files[2].size, 300);
    }

    #[test]
    fn test_filter_aliases() {
        assert_eq!(MediaFilter::from_str("image", true).unwrap(), MediaFilter::Images);
        assert_eq!(MediaFilter::from_str("VIDEOS", true).unwrap(), MediaFilter::Videos);
        assert_eq!(MediaFilter::from_str("all", true).unwrap(), MediaFilter::Both);
        assert!(MediaFilter::from_str("audio", true).is_err());
    }
}
