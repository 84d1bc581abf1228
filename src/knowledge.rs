//! Static diagnosis knowledge base.
//!
//! The label set is closed: every `Label` maps to exactly one `KnowledgeEntry`
//! through an exhaustive `match`, so a label without an entry (or an entry
//! without a label) does not compile. The table lives in `static` memory and is
//! never mutated, so concurrent requests read it without locking.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Diagnostic label produced by the classifier or resolved from a remote response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Aphids,
    PowderyMildew,
    LeafSpot,
    SpiderMites,
    Caterpillars,
    Rust,
    LateBlight,
    Thrips,
    Healthy,
}

impl Label {
    /// Every label, in knowledge-base order.
    pub const ALL: [Label; 9] = [
        Label::Aphids,
        Label::PowderyMildew,
        Label::LeafSpot,
        Label::SpiderMites,
        Label::Caterpillars,
        Label::Rust,
        Label::LateBlight,
        Label::Thrips,
        Label::Healthy,
    ];

    /// Stable snake_case key, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Aphids => "aphids",
            Label::PowderyMildew => "powdery_mildew",
            Label::LeafSpot => "leaf_spot",
            Label::SpiderMites => "spider_mites",
            Label::Caterpillars => "caterpillars",
            Label::Rust => "rust",
            Label::LateBlight => "late_blight",
            Label::Thrips => "thrips",
            Label::Healthy => "healthy",
        }
    }

    /// Exact key lookup (`"leaf_spot"` → `LeafSpot`). Case-insensitive.
    pub fn from_key(key: &str) -> Option<Label> {
        let key = key.trim().to_lowercase();
        Label::ALL.into_iter().find(|l| l.as_str() == key)
    }

    /// Resolve free text from a remote service ("Bacterial Leaf Spot",
    /// "powdery mildew fungus") to a label.
    ///
    /// Tries the exact key first, then keyword patterns in priority order.
    /// Returns `None` when nothing matches; callers decide how to treat that.
    pub fn resolve(text: &str) -> Option<Label> {
        if let Some(label) = Label::from_key(text) {
            return Some(label);
        }

        let name = text.to_lowercase();
        let has = |needle: &str| name.contains(needle);

        if has("aphid") {
            return Some(Label::Aphids);
        }
        if has("mildew") && has("powder") {
            return Some(Label::PowderyMildew);
        }
        if has("spot") || has("bacteria") {
            return Some(Label::LeafSpot);
        }
        if has("spider") || has("mite") {
            return Some(Label::SpiderMites);
        }
        if has("caterpillar") || has("larvae") || has("worm") {
            return Some(Label::Caterpillars);
        }
        if has("rust") {
            return Some(Label::Rust);
        }
        if has("blight") && has("late") {
            return Some(Label::LateBlight);
        }
        if has("thrip") {
            return Some(Label::Thrips);
        }
        if has("healthy") || has("normal") {
            return Some(Label::Healthy);
        }

        if has("fungal") || has("fungus") {
            if has("white") || has("powder") {
                return Some(Label::PowderyMildew);
            }
            if has("orange") || has("brown") {
                return Some(Label::Rust);
            }
            return Some(Label::LeafSpot);
        }

        if has("insect") || has("bug") || has("pest") {
            if has("small") || has("green") {
                return Some(Label::Aphids);
            }
            if has("web") {
                return Some(Label::SpiderMites);
            }
            if has("eat") || has("chew") {
                return Some(Label::Caterpillars);
            }
            return Some(Label::Thrips);
        }

        None
    }

    /// Knowledge-base entry for this label.
    pub fn entry(&self) -> &'static KnowledgeEntry {
        match self {
            Label::Aphids => &APHIDS,
            Label::PowderyMildew => &POWDERY_MILDEW,
            Label::LeafSpot => &LEAF_SPOT,
            Label::SpiderMites => &SPIDER_MITES,
            Label::Caterpillars => &CATERPILLARS,
            Label::Rust => &RUST,
            Label::LateBlight => &LATE_BLIGHT,
            Label::Thrips => &THRIPS,
            Label::Healthy => &HEALTHY,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently the condition needs treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    None,
    Moderate,
    High,
    Critical,
}

/// Broad category of a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisKind {
    Disease,
    Pest,
    Healthy,
}

/// Secondary candidate listed for a primary label.
///
/// `offset` is subtracted from the primary confidence; it is always positive so
/// the alternative ranks strictly below the primary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlternativeSpec {
    pub name: &'static str,
    /// Set when the alternative is itself a knowledge-base label.
    pub label: Option<Label>,
    pub offset: f32,
}

/// Read-only descriptive record for one label.
#[derive(Debug, PartialEq)]
pub struct KnowledgeEntry {
    pub label: Label,
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    /// Upper bound applied to any confidence reported for this label.
    pub confidence_ceiling: f32,
    pub kind: DiagnosisKind,
    pub symptoms: &'static [&'static str],
    pub control_measures: &'static [&'static str],
    /// Ordered by ascending offset (descending resulting confidence).
    pub alternatives: &'static [AlternativeSpec],
}

/// Version of the table below. Bump when entries, ceilings or offsets change.
pub const KNOWLEDGE_BASE_VERSION: u32 = 1;

const fn alt(name: &'static str, label: Option<Label>, offset: f32) -> AlternativeSpec {
    AlternativeSpec {
        name,
        label,
        offset,
    }
}

// ═══════════════════════════════════════════════════════════
// Entries
// ═══════════════════════════════════════════════════════════

static APHIDS: KnowledgeEntry = KnowledgeEntry {
    label: Label::Aphids,
    name: "Aphids Infestation",
    description: "Small, soft-bodied insects (1-4mm) that cluster on new growth, undersides of leaves, and stems. They pierce plant tissue to suck sap, causing yellowing, wilting, stunted growth, and honeydew secretion.",
    severity: Severity::Moderate,
    confidence_ceiling: 0.88,
    kind: DiagnosisKind::Pest,
    symptoms: &[
        "Curled or distorted leaves",
        "Yellowing of foliage",
        "Sticky honeydew on leaves",
        "Stunted plant growth",
        "Presence of ants",
    ],
    control_measures: &[
        "Spray with 2% neem oil solution every 7-10 days",
        "Use insecticidal soap (1-2% concentration) for immediate control",
        "Release beneficial insects: ladybugs (50-100 per plant), lacewings",
        "Apply systemic insecticides (imidacloprid) for severe infestations",
        "Remove heavily infested leaves and dispose in sealed bags",
        "Use reflective mulch to confuse aphids during early season",
    ],
    alternatives: &[
        alt("Whiteflies", None, 0.16),
        alt("Scale Insects", None, 0.23),
        alt("Thrips", Some(Label::Thrips), 0.43),
    ],
};

static POWDERY_MILDEW: KnowledgeEntry = KnowledgeEntry {
    label: Label::PowderyMildew,
    name: "Powdery Mildew",
    description: "Fungal disease caused by Erysiphales fungi, appearing as white to gray powdery spots on leaves, stems, and buds. Thrives in warm days (68-78°F) and cool nights with high humidity.",
    severity: Severity::High,
    confidence_ceiling: 0.94,
    kind: DiagnosisKind::Disease,
    symptoms: &[
        "White powdery coating on leaves",
        "Leaf yellowing and browning",
        "Stunted growth",
        "Premature leaf drop",
        "Reduced fruit quality",
    ],
    control_measures: &[
        "Apply sulfur-based fungicides (0.5-1% concentration) weekly",
        "Use copper-based fungicides for organic control",
        "Spray baking soda solution (1 tsp per quart water) as preventive",
        "Improve air circulation by proper plant spacing (30% more than normal)",
        "Remove and destroy infected plant parts immediately",
        "Avoid overhead watering - use drip irrigation",
        "Apply milk spray (1:10 ratio with water) as biological control",
    ],
    alternatives: &[
        alt("Downy Mildew", None, 0.18),
        alt("White Rust", None, 0.25),
        alt("Sooty Mold", None, 0.40),
    ],
};

static LEAF_SPOT: KnowledgeEntry = KnowledgeEntry {
    label: Label::LeafSpot,
    name: "Bacterial Leaf Spot",
    description: "Bacterial infection caused by Xanthomonas or Pseudomonas species, creating dark, water-soaked spots with yellow halos. Spreads rapidly in warm, humid conditions through water splash.",
    severity: Severity::Moderate,
    confidence_ceiling: 0.91,
    kind: DiagnosisKind::Disease,
    symptoms: &[
        "Dark water-soaked spots with yellow halos",
        "Leaf yellowing and defoliation",
        "Brown to black lesions",
        "Bacterial ooze in wet conditions",
    ],
    control_measures: &[
        "Apply copper-based bactericides (copper sulfate 0.5-1%)",
        "Use streptomycin sulfate for severe bacterial infections",
        "Remove infected leaves immediately and destroy",
        "Improve drainage and avoid overhead irrigation",
        "Disinfect tools with 70% alcohol between plants",
        "Use pathogen-free seeds and certified transplants",
        "Apply preventive copper sprays in high-risk periods",
    ],
    alternatives: &[
        alt("Fungal Leaf Spot", None, 0.15),
        alt("Anthracnose", None, 0.22),
        alt("Early Blight", None, 0.28),
    ],
};

static SPIDER_MITES: KnowledgeEntry = KnowledgeEntry {
    label: Label::SpiderMites,
    name: "Spider Mites",
    description: "Tiny arachnids (0.4mm) that cause stippling damage on leaves, often with fine webbing. Thrive in hot, dry conditions and can reproduce rapidly (generation every 10-14 days).",
    severity: Severity::High,
    confidence_ceiling: 0.92,
    kind: DiagnosisKind::Pest,
    symptoms: &[
        "Fine stippling on leaf surface",
        "Webbing on leaves and stems",
        "Yellowing and bronzing of leaves",
        "Premature leaf drop",
        "Reduced plant vigor",
    ],
    control_measures: &[
        "Increase humidity around plants (mist regularly)",
        "Use miticide sprays (abamectin or bifenthrin) every 5-7 days",
        "Release predatory mites (Phytoseiulus persimilis) as biological control",
        "Wash plants with strong water spray to dislodge mites",
        "Apply neem oil (2-3%) or insecticidal soap weekly",
        "Remove heavily infested leaves and destroy",
        "Use reflective mulch to reduce heat stress",
    ],
    alternatives: &[
        alt("Thrips", Some(Label::Thrips), 0.12),
        alt("Aphids", Some(Label::Aphids), 0.19),
        alt("Leaf Miners", None, 0.51),
    ],
};

static CATERPILLARS: KnowledgeEntry = KnowledgeEntry {
    label: Label::Caterpillars,
    name: "Caterpillar Damage",
    description: "Larvae of moths or butterflies that feed on plant foliage, creating irregular holes and potentially causing complete defoliation. Size varies from 1-5cm depending on species and stage.",
    severity: Severity::Moderate,
    confidence_ceiling: 0.89,
    kind: DiagnosisKind::Pest,
    symptoms: &[
        "Irregular holes in leaves",
        "Chewed leaf edges",
        "Presence of frass (droppings)",
        "Visible caterpillars on plants",
        "Skeletonized leaves",
    ],
    control_measures: &[
        "Hand-pick caterpillars when population is manageable (<10 per plant)",
        "Apply Bacillus thuringiensis (Bt) spray weekly during larval stage",
        "Use pheromone traps for adult moths (1 trap per 50 plants)",
        "Encourage beneficial insects: parasitic wasps, spiders",
        "Apply spinosad-based insecticides for organic control",
        "Use row covers during peak moth flight periods",
        "Apply appropriate insecticides (chlorantraniliprole) if severe",
    ],
    alternatives: &[
        alt("Leaf Miners", None, 0.28),
        alt("Beetles", None, 0.34),
        alt("Grasshoppers", None, 0.46),
    ],
};

static RUST: KnowledgeEntry = KnowledgeEntry {
    label: Label::Rust,
    name: "Plant Rust Disease",
    description: "Fungal disease caused by various rust fungi, producing orange, red, or brown pustules (uredinia) on leaves and stems. Spreads via airborne spores and favors humid conditions.",
    severity: Severity::High,
    confidence_ceiling: 0.93,
    kind: DiagnosisKind::Disease,
    symptoms: &[
        "Orange to brown pustules on leaves",
        "Yellow spots on upper leaf surface",
        "Premature leaf drop",
        "Weakened plant structure",
        "Reduced yield",
    ],
    control_measures: &[
        "Apply preventive fungicides (propiconazole or tebuconazole)",
        "Use copper-based fungicides for organic management",
        "Remove infected plant debris and destroy completely",
        "Ensure excellent air circulation (space plants 25% wider)",
        "Avoid overhead watering - use ground-level irrigation",
        "Plant rust-resistant varieties when available",
        "Apply sulfur dust (2-3 lbs per acre) as preventive measure",
    ],
    alternatives: &[
        alt("Leaf Spot", Some(Label::LeafSpot), 0.14),
        alt("Late Blight", Some(Label::LateBlight), 0.20),
        alt("Anthracnose", None, 0.34),
    ],
};

static LATE_BLIGHT: KnowledgeEntry = KnowledgeEntry {
    label: Label::LateBlight,
    name: "Late Blight",
    description: "Devastating oomycete disease caused by Phytophthora infestans. Affects potatoes and tomatoes, causing rapid plant death in cool, wet conditions. Can destroy entire crops within days.",
    severity: Severity::Critical,
    confidence_ceiling: 0.96,
    kind: DiagnosisKind::Disease,
    symptoms: &[
        "Dark water-soaked lesions on leaves",
        "White fuzzy growth on leaf undersides",
        "Brown to black stem lesions",
        "Rapid plant collapse",
        "Potato tuber rot",
    ],
    control_measures: &[
        "Apply preventive fungicides (metalaxyl + mancozeb) before symptoms appear",
        "Use copper-based fungicides in organic systems",
        "Destroy infected plants immediately - do not compost",
        "Improve air circulation and reduce leaf wetness",
        "Avoid overhead irrigation completely",
        "Plant certified disease-free seed potatoes/transplants",
        "Monitor weather for favorable disease conditions (cool + wet)",
    ],
    alternatives: &[
        alt("Early Blight", None, 0.18),
        alt("Bacterial Spot", None, 0.31),
        alt("Septoria Leaf Spot", None, 0.39),
    ],
};

static THRIPS: KnowledgeEntry = KnowledgeEntry {
    label: Label::Thrips,
    name: "Thrips Damage",
    description: "Tiny slender insects (1-2mm) that rasp leaf surfaces and suck plant juices, causing silvery stippling and distortion. Can transmit viral diseases and thrive in warm, dry conditions.",
    severity: Severity::Moderate,
    confidence_ceiling: 0.87,
    kind: DiagnosisKind::Pest,
    symptoms: &[
        "Silvery stippling on leaves",
        "Black specks (thrips excrement)",
        "Leaf curling and distortion",
        "Silvery appearance to foliage",
        "Stunted growth",
    ],
    control_measures: &[
        "Use blue sticky traps (1 per 10 plants) for monitoring and control",
        "Apply insecticidal soap (2-3%) or neem oil weekly",
        "Release predatory mites (Amblyseius cucumeris) for biological control",
        "Use spinosad-based insecticides for severe infestations",
        "Improve humidity levels around plants",
        "Remove weeds that serve as alternate hosts",
        "Apply systemic insecticides (imidacloprid) if necessary",
    ],
    alternatives: &[
        alt("Spider Mites", Some(Label::SpiderMites), 0.16),
        alt("Aphids", Some(Label::Aphids), 0.29),
        alt("Whiteflies", None, 0.38),
    ],
};

static HEALTHY: KnowledgeEntry = KnowledgeEntry {
    label: Label::Healthy,
    name: "Healthy Plant",
    description: "No significant pest or disease issues detected. Plant shows good vigor with proper coloration, no visible damage, and normal growth patterns. Continue preventive care.",
    severity: Severity::None,
    confidence_ceiling: 0.97,
    kind: DiagnosisKind::Healthy,
    symptoms: &[
        "Vibrant green coloration",
        "No visible damage or spots",
        "Normal growth rate",
        "No pest presence",
        "Good leaf structure",
    ],
    control_measures: &[
        "Continue current care routine and monitoring",
        "Maintain regular inspection schedule (weekly)",
        "Ensure proper watering and fertilization program",
        "Maintain adequate sunlight and air circulation",
        "Practice preventive measures like crop rotation",
        "Keep area free of plant debris and weeds",
        "Monitor for early signs of stress or pest activity",
    ],
    alternatives: &[],
};

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
