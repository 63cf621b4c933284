//! Last-processed date / 上次处理日期
//!
//! Stored as a single `YYYY-MM-DD` line so it can be inspected or edited by
//! hand.

use chrono::NaiveDate;
use std::path::Path;

use crate::error::WatermarkError;

/// Default watermark file / 默认水位文件
pub const DEFAULT_WATERMARK_FILE: &str = "last_processed_date.txt";

/// Longest look-back window in days / 最长回溯天数
pub const MAX_FETCH_DAYS: u32 = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watermark {
    pub last_processed: Option<NaiveDate>,
}

impl Watermark {
    pub fn new(last_processed: NaiveDate) -> Self {
        Self {
            last_processed: Some(last_processed),
        }
    }

    /// Read the watermark; a missing or unreadable file means "never run"
    /// 读取水位，文件缺失或损坏视为从未运行
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("No watermark at {:?}, treating this as the first run", path);
            return Self::default();
        }

        match Self::read(path) {
            Ok(watermark) => watermark,
            Err(e) => {
                tracing::warn!("Ignoring watermark {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self, WatermarkError> {
        let content = std::fs::read_to_string(path)?;
        let line = content.trim();
        let date = NaiveDate::parse_from_str(line, DATE_FORMAT)
            .map_err(|_| WatermarkError::Date(line.to_string()))?;
        Ok(Self::new(date))
    }

    /// Persist the watermark / 保存水位
    pub fn save(&self, path: &Path) -> Result<(), WatermarkError> {
        let content = self
            .last_processed
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default();
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Days to look back for new papers, `None` when already up to date
/// 计算需要回溯的天数，当天已处理则返回 `None`
pub fn fetch_window(watermark: &Watermark, today: NaiveDate, force_refresh: bool) -> Option<u32> {
    if force_refresh {
        tracing::info!("Force refresh requested, fetching the last {} days", MAX_FETCH_DAYS);
        return Some(MAX_FETCH_DAYS);
    }

    let Some(last) = watermark.last_processed else {
        return Some(MAX_FETCH_DAYS);
    };

    let days = (today - last).num_days();
    if days <= 0 {
        tracing::info!("Already processed papers for {}", today);
        return None;
    }
    if days > MAX_FETCH_DAYS as i64 {
        tracing::warn!(
            "Last run was {} days ago, only the last {} days will be fetched",
            days,
            MAX_FETCH_DAYS
        );
        return Some(MAX_FETCH_DAYS);
    }
    Some(days as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_WATERMARK_FILE);

        assert_eq!(Watermark::load(&path), Watermark::default());

        Watermark::new(date(2024, 3, 9)).save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "2024-03-09");
        assert_eq!(Watermark::load(&path).last_processed, Some(date(2024, 3, 9)));
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wm.txt");
        std::fs::write(&path, "yesterday\n").unwrap();
        assert_eq!(Watermark::load(&path), Watermark::default());
    }

    #[test]
    fn test_fetch_window() {
        let today = date(2024, 3, 10);

        assert_eq!(fetch_window(&Watermark::default(), today, false), Some(7));
        assert_eq!(fetch_window(&Watermark::new(today), today, false), None);
        assert_eq!(fetch_window(&Watermark::new(today), today, true), Some(7));
        assert_eq!(fetch_window(&Watermark::new(date(2024, 3, 8)), today, false), Some(2));
        assert_eq!(fetch_window(&Watermark::new(date(2024, 1, 1)), today, false), Some(7));
        // Clock moved backwards
        assert_eq!(fetch_window(&Watermark::new(date(2024, 3, 12)), today, false), None);
    }
}
