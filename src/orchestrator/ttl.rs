//! TTL classification table.
//!
//! Maps the semantic category of cached data to its lifetime in seconds.

use std::fmt;
use std::str::FromStr;

/// Lifetime used for any category name the table does not know.
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// Semantic category of a cached response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataCategory {
    UserProfile,
    ChannelInfo,
    ChannelList,
    MessageSingle,
    MessageList,
    MessageStats,
    NotificationSingle,
    NotificationList,
    NotificationStats,
    FileInfo,
    FileDownload,
    FileStats,
    SearchResults,
    AnalyticsReport,
    Permissions,
    Session,
    Temporary,
}

impl DataCategory {
    pub const ALL: [DataCategory; 17] = [
        DataCategory::UserProfile,
        DataCategory::ChannelInfo,
        DataCategory::ChannelList,
        DataCategory::MessageSingle,
        DataCategory::MessageList,
        DataCategory::MessageStats,
        DataCategory::NotificationSingle,
        DataCategory::NotificationList,
        DataCategory::NotificationStats,
        DataCategory::FileInfo,
        DataCategory::FileDownload,
        DataCategory::FileStats,
        DataCategory::SearchResults,
        DataCategory::AnalyticsReport,
        DataCategory::Permissions,
        DataCategory::Session,
        DataCategory::Temporary,
    ];

    /// Lifetime in seconds.
    pub const fn ttl_seconds(self) -> u64 {
        match self {
            DataCategory::UserProfile => 1800,
            DataCategory::ChannelInfo => 1800,
            DataCategory::ChannelList => 900,
            DataCategory::MessageSingle => 600,
            DataCategory::MessageList => 300,
            DataCategory::MessageStats => 600,
            DataCategory::NotificationSingle => 600,
            DataCategory::NotificationList => 120,
            DataCategory::NotificationStats => 300,
            DataCategory::FileInfo => 1800,
            DataCategory::FileDownload => 900,
            DataCategory::FileStats => 600,
            DataCategory::SearchResults => 300,
            DataCategory::AnalyticsReport => 3600,
            DataCategory::Permissions => 1800,
            DataCategory::Session => 3600,
            DataCategory::Temporary => 60,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DataCategory::UserProfile => "user_profile",
            DataCategory::ChannelInfo => "channel_info",
            DataCategory::ChannelList => "channel_list",
            DataCategory::MessageSingle => "message_single",
            DataCategory::MessageList => "message_list",
            DataCategory::MessageStats => "message_stats",
            DataCategory::NotificationSingle => "notification_single",
            DataCategory::NotificationList => "notification_list",
            DataCategory::NotificationStats => "notification_stats",
            DataCategory::FileInfo => "file_info",
            DataCategory::FileDownload => "file_download",
            DataCategory::FileStats => "file_stats",
            DataCategory::SearchResults => "search_results",
            DataCategory::AnalyticsReport => "analytics_report",
            DataCategory::Permissions => "permissions",
            DataCategory::Session => "session",
            DataCategory::Temporary => "temporary",
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataCategory {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        DataCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == name)
            .ok_or(())
    }
}

/// TTL for a category given by name; unknown names get the default.
pub fn calculate_ttl(category: &str) -> u64 {
    category
        .parse::<DataCategory>()
        .map(DataCategory::ttl_seconds)
        .unwrap_or(DEFAULT_TTL_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories() {
        assert_eq!(calculate_ttl("user_profile"), 1800);
        assert_eq!(calculate_ttl("channel_list"), 900);
        assert_eq!(calculate_ttl("analytics_report"), 3600);
        assert_eq!(calculate_ttl("temporary"), 60);
    }

    #[test]
    fn test_unknown_category_falls_back() {
        assert_eq!(calculate_ttl("totally_unknown"), 300);
        assert_eq!(calculate_ttl(""), DEFAULT_TTL_SECONDS);
    }

    #[test]
    fn test_names_round_trip() {
        for category in DataCategory::ALL {
            assert_eq!(category.as_str().parse::<DataCategory>(), Ok(category));
            assert_eq!(calculate_ttl(category.as_str()), category.ttl_seconds());
            assert!(category.ttl_seconds() > 0);
        }
    }
}
