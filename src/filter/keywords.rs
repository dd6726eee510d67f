//! Built-in keyword tables.
//!
//! Latin terms are written lowercase and matched against the lowercased
//! title; terms containing CJK characters are matched against the raw title.
//! Order matters wherever a table is scanned first-match-wins (facility,
//! channels, countries).

use crate::filter::kinds::Channel;

// ───────────────────────────── Event terms ───────────────────────────────

pub const FIRE_KEYWORDS: &[&str] = &[
    "fire",
    "blaze",
    "ablaze",
    "inferno",
    "flames",
    "火災",
    "火警",
    "起火",
    "燒毀",
    "救災",
    "失火",
    "大火",
    "火勢",
    "燃燒",
];

pub const EXPLOSION_KEYWORDS: &[&str] = &[
    "explosion",
    "explode", // explode, exploded, explodes
    "explosive",
    "blast",
    "detonat",
    "爆炸",
    "氣爆",
    "噴出",
    "洩漏",
    "外洩",
];

// ───────────────────────────── Facilities ────────────────────────────────

/// Facility / location terms. Specific terms come before generic ones
/// because the tuple fingerprint takes the first declared match.
pub const FACILITY_KEYWORDS: &[&str] = &[
    "refinery",
    "chemical plant",
    "power plant",
    "power station",
    "warehouse",
    "factory",
    "foundry",
    "smelter",
    "steel mill",
    "mill",
    "plant",
    "workshop",
    "industrial",
    "facility",
    "depot",
    "storage tank",
    "tank farm",
    "pipeline",
    "coal mine",
    "工廠",
    "廠房",
    "倉儲",
    "倉庫",
    "工業",
    "園區",
    "公司",
    "科技",
    "電子",
    "廠",
    "中心",
    "作業",
    "現場",
    "槽",
    "管",
];

// ───────────────────────────── Exclusions ────────────────────────────────

/// Absolute exclusions: drills, markets, politics, games, gunfire and
/// fire-as-metaphor idioms. Checked before anything else.
pub const EXCLUDE_KEYWORDS: &[&str] = &[
    // drills / simulations
    "fire drill",
    "drills",
    "simulation",
    "simulator",
    "exercise",
    // markets / politics
    "stock market",
    "stocks",
    "shares",
    "tariff",
    "election",
    // idioms and non-incident "fire"
    "under fire",
    "ceasefire",
    "cease-fire",
    "open fire",
    "opened fire",
    "opens fire",
    "gunfire",
    "fire sale",
    "firefox",
    "fire tv",
    "wildfire",
    "bushfire",
    "forest fire",
    "video game",
    // CJK
    "遊戲",
    "限免",
    "模擬器",
    "大亨",
    "缺工",
    "關稅",
    "股市",
    "講座",
    "論壇",
    "內閣",
    "選",
    "金正恩",
    "研討會",
    "營收",
    "房市",
    "演習",
    "演練",
    "山火",
    "森林大火",
];

/// Figurative uses of fire / explosion words. A hit rejects the title
/// unless a [`CONFIRM_KEYWORDS`] phrase is also present.
pub const METAPHOR_KEYWORDS: &[&str] = &[
    "fire up",
    "fired up",
    "fires up",
    "firing up",
    "political fire",
    "line of fire",
    "baptism of fire",
    "fire back",
    "fires back",
    "fired back",
    "playing with fire",
    "fuel to the fire",
    "ignites",
    "sparks outrage",
    "explosive growth",
    "explosive report",
    "戰火",
    "砲火",
    "炮火",
    "怒火",
    "火熱",
    "火紅",
    "惹火",
    "爆料",
    "爆紅",
];

/// Phrases that only occur around real incidents; they override a
/// metaphor hit (never an exclusion).
pub const CONFIRM_KEYWORDS: &[&str] = &[
    "firefighter",
    "fire crew",
    "fire brigade",
    "fire department",
    "evacuat",
    "casualt",
    "killed",
    "injured",
    "消防",
    "撤離",
    "疏散",
    "傷",
    "死",
    "罹難",
];

// ───────────────────────────── Severity ──────────────────────────────────

pub const FATALITY_KEYWORDS: &[&str] = &[
    "kill", // kill, kills, killed, killing
    "dead",
    "death",
    "fatal",
    "died",
    "dies",
    "死",
    "罹難",
    "喪生",
    "身亡",
];

pub const INJURY_KEYWORDS: &[&str] = &[
    "injur", // injured, injures, injuries
    "hurt",
    "wounded",
    "hospitalised",
    "hospitalized",
    "傷",
    "送醫",
];

// ───────────────────────────── Noise words ───────────────────────────────

/// Words stripped before a title is normalized for fingerprinting.
/// Latin entries only match as whole words.
pub const NOISE_KEYWORDS: &[&str] = &[
    "at least",
    "reportedly",
    "updated",
    "update",
    "breaking",
    "live",
    "watch",
    "video",
    "photos",
    "快訊",
    "最新",
    "更新",
    "獨家",
    "影音",
    "直擊",
];

// ───────────────────────────── Channels ──────────────────────────────────

/// Channel term sets in precedence order. GENERAL has no terms: it is the
/// fallback when nothing here matches.
pub const CHANNEL_KEYWORDS: &[(Channel, &[&str])] = &[
    (
        Channel::Chemical,
        &[
            "chemical", // also covers petrochemical
            "solvent",
            "toxic",
            "gas leak",
            "ammonia",
            "chlorine",
            "化工",
            "化學",
            "石化",
            "毒",
        ],
    ),
    (
        Channel::Energy,
        &[
            "refinery",
            "power plant",
            "power station",
            "substation",
            "solar",
            "battery",
            "lithium",
            "oil depot",
            "oil tank",
            "oilfield",
            "oil field",
            "natural gas",
            "pipeline",
            "太陽能",
            "儲能",
            "電池", // also covers 鋰電池
            "電廠",
            "發電",
            "煉油",
            "油槽",
            "變電",
        ],
    ),
    (
        Channel::Tech,
        &[
            "semiconductor",
            "chip",
            "electronics",
            "data center",
            "datacenter",
            "wafer",
            "半導體",
            "晶圓",
            "科技",
            "電子",
            "資料中心",
        ],
    ),
    (
        Channel::Building,
        &[
            "building",
            "apartment",
            "high-rise",
            "residential",
            "warehouse",
            "大樓",
            "住宅",
            "公寓",
            "倉庫",
            "倉儲",
            "商場",
        ],
    ),
];

// ───────────────────────────── Countries ─────────────────────────────────

/// Flag used when no country term matches.
pub const DEFAULT_FLAG: &str = "🌐";

/// Country tokens in scan order. Entries whose terms contain another
/// country's name (Indiana / India) must come first. Demonyms and bare
/// continent names are left out: "Chinese-owned" or "South America" say
/// nothing about where the fire is.
pub const COUNTRY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "🇹🇼",
        &[
            "台灣", "臺灣", "台北", "臺北", "新北", "桃園", "台中", "臺中", "台南", "臺南", "高雄",
            "新竹", "苗栗", "彰化", "雲林", "嘉義", "屏東", "宜蘭", "花蓮", "基隆", "taiwan",
            "taipei", "kaohsiung", "taichung", ".com.tw", ".org.tw",
        ],
    ),
    (
        "🇯🇵",
        &["日本", "東京", "大阪", "japan", "tokyo", "osaka", ".co.jp"],
    ),
    (
        "🇰🇷",
        &["南韓", "韓國", "首爾", "south korea", "seoul", ".co.kr"],
    ),
    (
        "🇨🇳",
        &[
            "中國", "大陸", "上海", "北京", "廣東", "江蘇", "山東", "china", "shanghai", "beijing",
            "guangdong", "jiangsu", ".com.cn",
        ],
    ),
    (
        "🇺🇸",
        &[
            "美國",
            "德州",
            "加州",
            "united states",
            "texas",
            "california",
            "louisiana",
            "ohio",
            "indiana",
            "pennsylvania",
        ],
    ),
    ("🇮🇳", &["印度", "india"]),
    ("🇩🇪", &["德國", "germany", "ludwigshafen", "hamburg"]),
    ("🇬🇧", &["英國", "britain", "england", "london", ".co.uk"]),
    ("🇷🇺", &["俄羅斯", "russia"]),
    ("🇹🇭", &["泰國", "thailand", "bangkok"]),
    ("🇻🇳", &["越南", "vietnam"]),
    ("🇮🇩", &["印尼", "indonesia"]),
    ("🇧🇩", &["孟加拉", "bangladesh"]),
    ("🇳🇬", &["奈及利亞", "nigeria"]),
];
