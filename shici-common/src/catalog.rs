//! Fixed reference data: dynasties and the corpus collections
//!
//! Collections double as the category list. Their order here is the corpus
//! iteration order used by listing, search and ingestion.

use serde::Serialize;

/// Historical period label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dynasty {
    pub id: &'static str,
    /// Display name (唐代)
    pub name: &'static str,
    /// Short label stored on works and authors (唐)
    pub label: &'static str,
    pub name_en: &'static str,
    pub period: &'static str,
    pub sort_order: i32,
}

const fn dynasty(
    id: &'static str,
    name: &'static str,
    label: &'static str,
    name_en: &'static str,
    period: &'static str,
    sort_order: i32,
) -> Dynasty {
    Dynasty {
        id,
        name,
        label,
        name_en,
        period,
        sort_order,
    }
}

pub static DYNASTIES: [Dynasty; 9] = [
    dynasty("preqin", "先秦", "先秦", "Pre-Qin", "-207 BC", 0),
    dynasty("hanwei", "汉魏", "汉魏", "Han and Wei", "206 BC-266", 1),
    dynasty("tang", "唐代", "唐", "Tang Dynasty", "618-907", 2),
    dynasty("wudai", "五代", "五代", "Five Dynasties", "907-960", 3),
    dynasty("song", "宋代", "宋", "Song Dynasty", "960-1279", 4),
    dynasty("yuan", "元代", "元", "Yuan Dynasty", "1271-1368", 5),
    dynasty("ming", "明代", "明", "Ming Dynasty", "1368-1644", 6),
    dynasty("qing", "清代", "清", "Qing Dynasty", "1644-1912", 7),
    dynasty("other", "其他", "其他", "Other", "-", 99),
];

/// All dynasties sorted by display order
pub fn dynasties() -> Vec<Dynasty> {
    let mut all = DYNASTIES.to_vec();
    all.sort_by_key(|d| d.sort_order);
    all
}

/// Look up a dynasty by id, display name or label
pub fn find_dynasty(key: &str) -> Option<&'static Dynasty> {
    let key = key.trim();
    DYNASTIES
        .iter()
        .find(|d| d.id.eq_ignore_ascii_case(key) || d.name == key || d.label == key)
}

/// Which files in a collection directory hold records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRule {
    /// Every `.json` file
    Json,
    /// `.json` files whose name starts with the prefix
    Prefixed(&'static str),
    /// `.json` files whose name does not start with the prefix
    JsonExcept(&'static str),
}

impl FileRule {
    pub fn matches(&self, file_name: &str) -> bool {
        if !file_name.ends_with(".json") {
            return false;
        }
        match self {
            FileRule::Json => true,
            FileRule::Prefixed(prefix) => file_name.starts_with(prefix),
            FileRule::JsonExcept(prefix) => !file_name.starts_with(prefix),
        }
    }
}

/// Author applied when a record names none
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorRule {
    Unknown,
    Named(&'static str),
    /// Keyed by file stem; unmatched files fall back to the unknown sentinel
    PerFile(&'static [(&'static str, &'static str)]),
}

impl AuthorRule {
    pub fn author_for(&self, file_stem: &str) -> &'static str {
        match self {
            AuthorRule::Unknown => crate::models::UNKNOWN_AUTHOR,
            AuthorRule::Named(name) => name,
            AuthorRule::PerFile(table) => table
                .iter()
                .find(|(stem, _)| *stem == file_stem)
                .map(|(_, name)| *name)
                .unwrap_or(crate::models::UNKNOWN_AUTHOR),
        }
    }
}

/// Title applied when a record has neither title nor rhythmic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRule {
    None,
    /// Use the record's `chapter`
    Chapter,
    /// `<prefix>-<n>` with n the 1-based record position in its file
    Sequence(&'static str),
}

/// A named, independently ingested sub-corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Directory under the data root
    pub dir: &'static str,
    /// Default dynasty id
    pub dynasty: &'static str,
    pub sort_order: i32,
    pub files: FileRule,
    pub default_author: AuthorRule,
    pub title_rule: TitleRule,
    /// Author biography file in the collection directory
    pub biographies: Option<&'static str>,
}

impl Collection {
    /// Canonical label of the collection's default dynasty
    pub fn dynasty_label(&self) -> &'static str {
        find_dynasty(self.dynasty)
            .map(|d| d.label)
            .unwrap_or("其他")
    }

    pub fn category(&self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            description: self.description,
            dynasty_id: self.dynasty,
            sort_order: self.sort_order,
        }
    }
}

/// Public view of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub dynasty_id: &'static str,
    pub sort_order: i32,
}

const SISHU_AUTHORS: &[(&str, &str)] = &[("daxue", "曾子"), ("mengzi", "孟子"), ("zhongyong", "子思")];

pub static COLLECTIONS: [Collection; 12] = [
    Collection {
        id: "shijing",
        name: "诗经",
        description: "中国最早的诗歌总集",
        dir: "诗经",
        dynasty: "preqin",
        sort_order: 0,
        files: FileRule::Json,
        default_author: AuthorRule::Unknown,
        title_rule: TitleRule::None,
        biographies: None,
    },
    Collection {
        id: "chuci",
        name: "楚辞",
        description: "战国时期楚国的诗歌总集",
        dir: "楚辞",
        dynasty: "preqin",
        sort_order: 1,
        files: FileRule::Json,
        default_author: AuthorRule::Named("屈原"),
        title_rule: TitleRule::None,
        biographies: None,
    },
    Collection {
        id: "lunyu",
        name: "论语",
        description: "孔子及其弟子的言行录",
        dir: "论语",
        dynasty: "preqin",
        sort_order: 2,
        files: FileRule::Json,
        default_author: AuthorRule::Named("孔子"),
        title_rule: TitleRule::Chapter,
        biographies: None,
    },
    Collection {
        id: "sishuwujing",
        name: "四书五经",
        description: "儒家经典",
        dir: "四书五经",
        dynasty: "preqin",
        sort_order: 3,
        files: FileRule::Json,
        default_author: AuthorRule::PerFile(SISHU_AUTHORS),
        title_rule: TitleRule::Chapter,
        biographies: None,
    },
    Collection {
        id: "caocao",
        name: "曹操诗集",
        description: "曹操诗作",
        dir: "曹操诗集",
        dynasty: "hanwei",
        sort_order: 4,
        files: FileRule::Json,
        default_author: AuthorRule::Named("曹操"),
        title_rule: TitleRule::None,
        biographies: None,
    },
    Collection {
        id: "quantangshi",
        name: "全唐诗",
        description: "唐代诗歌总集",
        dir: "全唐诗",
        dynasty: "tang",
        sort_order: 5,
        files: FileRule::Prefixed("poet.tang."),
        default_author: AuthorRule::Unknown,
        title_rule: TitleRule::None,
        biographies: Some("authors.tang.json"),
    },
    Collection {
        id: "shuimotangshi",
        name: "水墨唐诗",
        description: "水墨唐诗选",
        dir: "水墨唐诗",
        dynasty: "tang",
        sort_order: 6,
        files: FileRule::Json,
        default_author: AuthorRule::Unknown,
        title_rule: TitleRule::None,
        biographies: None,
    },
    Collection {
        id: "wudai",
        name: "五代诗词",
        description: "花间集与南唐二主词",
        dir: "五代诗词",
        dynasty: "wudai",
        sort_order: 7,
        files: FileRule::JsonExcept("author"),
        default_author: AuthorRule::Unknown,
        title_rule: TitleRule::None,
        biographies: None,
    },
    Collection {
        id: "songci",
        name: "宋词",
        description: "宋代词作总集",
        dir: "宋词",
        dynasty: "song",
        sort_order: 8,
        files: FileRule::Prefixed("ci.song."),
        default_author: AuthorRule::Unknown,
        title_rule: TitleRule::None,
        biographies: Some("author.song.json"),
    },
    Collection {
        id: "yuanqu",
        name: "元曲",
        description: "元代散曲与杂剧",
        dir: "元曲",
        dynasty: "yuan",
        sort_order: 9,
        files: FileRule::Json,
        default_author: AuthorRule::Unknown,
        title_rule: TitleRule::None,
        biographies: None,
    },
    Collection {
        id: "nalan",
        name: "纳兰性德",
        description: "纳兰性德诗词",
        dir: "纳兰性德",
        dynasty: "qing",
        sort_order: 10,
        files: FileRule::Json,
        default_author: AuthorRule::Named("纳兰性德"),
        title_rule: TitleRule::None,
        biographies: None,
    },
    Collection {
        id: "youmengying",
        name: "幽梦影",
        description: "张潮小品文集",
        dir: "幽梦影",
        dynasty: "qing",
        sort_order: 11,
        files: FileRule::Json,
        default_author: AuthorRule::Named("张潮"),
        title_rule: TitleRule::Sequence("幽梦影"),
        biographies: None,
    },
];

/// All collections in corpus order
pub fn collections() -> &'static [Collection] {
    &COLLECTIONS
}

/// Public category list sorted by display order
pub fn categories() -> Vec<Category> {
    let mut all: Vec<Category> = COLLECTIONS.iter().map(Collection::category).collect();
    all.sort_by_key(|c| c.sort_order);
    all
}

/// Look up a collection by id, display name or directory
pub fn find_collection(key: &str) -> Option<&'static Collection> {
    let key = key.trim();
    COLLECTIONS
        .iter()
        .find(|c| c.id.eq_ignore_ascii_case(key) || c.name == key || c.dir == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynasties_sorted() {
        let all = dynasties();
        assert_eq!(all.first().map(|d| d.id), Some("preqin"));
        assert_eq!(all.last().map(|d| d.id), Some("other"));
        assert!(all.windows(2).all(|w| w[0].sort_order <= w[1].sort_order));
    }

    #[test]
    fn test_find_dynasty_by_any_name() {
        assert_eq!(find_dynasty("tang").map(|d| d.label), Some("唐"));
        assert_eq!(find_dynasty("唐代").map(|d| d.label), Some("唐"));
        assert_eq!(find_dynasty("唐").map(|d| d.id), Some("tang"));
        assert!(find_dynasty("秦汉").is_none());
    }

    #[test]
    fn test_file_rules() {
        let tang = find_collection("quantangshi").unwrap();
        assert!(tang.files.matches("poet.tang.0.json"));
        assert!(!tang.files.matches("poet.song.0.json"));
        assert!(!tang.files.matches("authors.tang.json"));

        let wudai = find_collection("wudai").unwrap();
        assert!(wudai.files.matches("poetrys.json"));
        assert!(!wudai.files.matches("authors.json"));
        assert!(!wudai.files.matches("README.md"));
    }

    #[test]
    fn test_author_rules() {
        let sishu = find_collection("四书五经").unwrap();
        assert_eq!(sishu.default_author.author_for("mengzi"), "孟子");
        assert_eq!(sishu.default_author.author_for("chunqiu"), "佚名");
        assert_eq!(AuthorRule::Named("曹操").author_for("anything"), "曹操");
    }

    #[test]
    fn test_categories_cover_collections_in_order() {
        let cats = categories();
        assert_eq!(cats.len(), COLLECTIONS.len());
        assert_eq!(cats[0].id, "shijing");
        assert!(cats.windows(2).all(|w| w[0].sort_order < w[1].sort_order));
    }

    #[test]
    fn test_every_collection_has_known_dynasty() {
        for c in collections() {
            assert!(find_dynasty(c.dynasty).is_some(), "{} has unknown dynasty", c.id);
        }
    }
}
