//! Canonical field schema for keyword performance sheets.
//!
//! Uploaded sheets name their columns freely (English, Japanese, vendor
//! shorthand). Every column the pipeline cares about is resolved onto one
//! of these eight fixed roles before anything else runs.

use serde::{Deserialize, Serialize};

/// The fixed semantic roles a sheet column can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    Keyword,
    MatchType,
    Impressions,
    Clicks,
    Cost,
    Conversions,
    CampaignName,
    AdGroupName,
}

impl CanonicalField {
    /// All fields, in resolution priority order (ties in fuzzy matching
    /// break toward the earlier entry).
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::Keyword,
        CanonicalField::MatchType,
        CanonicalField::Impressions,
        CanonicalField::Clicks,
        CanonicalField::Cost,
        CanonicalField::Conversions,
        CanonicalField::CampaignName,
        CanonicalField::AdGroupName,
    ];

    /// Fields a dataset cannot proceed without.
    pub const REQUIRED: [CanonicalField; 6] = [
        CanonicalField::Keyword,
        CanonicalField::MatchType,
        CanonicalField::Impressions,
        CanonicalField::Clicks,
        CanonicalField::Cost,
        CanonicalField::Conversions,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::Keyword => "Keyword",
            CanonicalField::MatchType => "MatchType",
            CanonicalField::Impressions => "Impressions",
            CanonicalField::Clicks => "Clicks",
            CanonicalField::Cost => "Cost",
            CanonicalField::Conversions => "Conversions",
            CanonicalField::CampaignName => "CampaignName",
            CanonicalField::AdGroupName => "AdGroupName",
        }
    }

    /// Curated synonyms seen in real exports, English and Japanese both.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::Keyword => &[
                "キーワード",
                "keywords",
                "search term",
                "検索語句",
                "query",
                "kw",
                "キーワードテキスト",
            ],
            CanonicalField::MatchType => &[
                "マッチタイプ",
                "match type",
                "match",
                "matching",
                "タイプ",
                "一致タイプ",
                "一致キーワード",
                "マッチングタイプ",
            ],
            CanonicalField::Impressions => &[
                "imp",
                "imps",
                "impression",
                "インプレッション",
                "表示回数",
                "表示数",
                "露出数",
                "インプレッション数",
            ],
            CanonicalField::Clicks => &[
                "click",
                "クリック",
                "クリック数",
                "クリック回数",
                "click count",
                "clicks",
            ],
            CanonicalField::Cost => &[
                "コスト", "cost", "費用", "金額", "spend", "支出", "消化金額", "消化額",
            ],
            CanonicalField::Conversions => &[
                "conversion",
                "conv",
                "コンバージョン",
                "成約",
                "cv",
                "CVs",
                "獲得数",
                "コンバージョン数",
                "コンバ数",
                "GACV",
            ],
            CanonicalField::CampaignName => &[
                "キャンペーン名",
                "campaign",
                "キャンペーン",
                "campaign name",
                "キャンペーンネーム",
                "cp",
                "campname",
            ],
            CanonicalField::AdGroupName => &[
                "広告グループ名",
                "adgroup",
                "ad group",
                "広告グループ",
                "group name",
                "グループ名",
                "adgroupname",
                "ag",
            ],
        }
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    /// Case-insensitive lookup by canonical name.
    pub fn from_name(name: &str) -> Option<CanonicalField> {
        let lower = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().to_lowercase() == lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_subset_of_all() {
        for f in CanonicalField::REQUIRED {
            assert!(CanonicalField::ALL.contains(&f));
            assert!(f.is_required());
        }
        assert!(!CanonicalField::CampaignName.is_required());
        assert!(!CanonicalField::AdGroupName.is_required());
    }

    #[test]
    fn test_from_name_case_insensitive() {
        assert_eq!(
            CanonicalField::from_name("matchtype"),
            Some(CanonicalField::MatchType)
        );
        assert_eq!(
            CanonicalField::from_name("  Cost "),
            Some(CanonicalField::Cost)
        );
        assert_eq!(CanonicalField::from_name("totally unrelated"), None);
    }

    #[test]
    fn test_every_field_has_aliases() {
        for f in CanonicalField::ALL {
            assert!(!f.aliases().is_empty(), "{} has no aliases", f.name());
        }
    }
}
