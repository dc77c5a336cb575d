//! Curated bilingual keyword clusters.
//!
//! Each cluster groups the Filipino and English surface forms of one concept under a
//! single id so the response text exists exactly once. Surface forms are lower-case and
//! matched as substrings of the lower-cased description.

use super::domain::PredictedRisk;

/// Tailored action for a cluster, split by victim type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterResponse {
    pub child: &'static str,
    pub woman: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordCluster {
    pub id: &'static str,
    pub category: PredictedRisk,
    pub surface_forms: &'static [&'static str],
    pub response: Option<ClusterResponse>,
}

pub static KEYWORD_CLUSTERS: &[KeywordCluster] = &[
    // Economic
    KeywordCluster {
        id: "withheld_support",
        category: PredictedRisk::Economic,
        surface_forms: &[
            "hindi nagbibigay ng sustento",
            "walang sustento",
            "ayaw magbigay ng sustento",
            "no financial support",
            "refuses to give support",
            "withheld support",
            "child support",
        ],
        response: Some(ClusterResponse {
            child: "Refer the guardian to the PAO for a petition for child support and coordinate with the MSWDO for interim assistance.",
            woman: "Assist the victim in filing for financial support under RA 9262 and refer to the PAO for free legal representation.",
        }),
    },
    KeywordCluster {
        id: "salary_taken",
        category: PredictedRisk::Economic,
        surface_forms: &[
            "kinukuha ang sweldo",
            "kinuha ang sweldo",
            "kinukuha ang pera",
            "took my salary",
            "takes my salary",
            "took my money",
            "controls my money",
        ],
        response: Some(ClusterResponse {
            child: "Document the deprivation of the child's resources and refer the household to the MSWDO for welfare assessment.",
            woman: "Document the financial control, advise the victim on securing her own income and bank access, and refer for a protection order covering economic abuse.",
        }),
    },
    KeywordCluster {
        id: "work_prohibited",
        category: PredictedRisk::Economic,
        surface_forms: &[
            "pinagbawalang magtrabaho",
            "ayaw akong pagtrabahuhin",
            "not allowed to work",
            "prevented from working",
        ],
        response: Some(ClusterResponse {
            child: "Check whether the child is being kept from school or forced into labor and refer to the DSWD child protection unit.",
            woman: "Refer the victim to livelihood and employment assistance programs and include work interference in the protection order application.",
        }),
    },
    KeywordCluster {
        id: "property_destroyed",
        category: PredictedRisk::Economic,
        surface_forms: &[
            "sinira ang gamit",
            "ibinenta ang ari-arian",
            "destroyed property",
            "destroyed my belongings",
            "sold our property",
        ],
        response: None,
    },
    KeywordCluster {
        id: "economic_abuse",
        category: PredictedRisk::Economic,
        surface_forms: &["economic abuse", "financial abuse", "pang-aabusong pinansyal"],
        response: None,
    },
    // Psychological
    KeywordCluster {
        id: "death_threat",
        category: PredictedRisk::Psychological,
        surface_forms: &[
            "papatayin kita",
            "papatayin daw",
            "i will kill you",
            "threatened to kill",
        ],
        response: Some(ClusterResponse {
            child: "Treat the threat as urgent: place the child in a safe setting, notify the WCPD, and begin a child safety plan.",
            woman: "Treat the death threat as urgent: apply for a Barangay Protection Order today, record the threat verbatim, and prepare a safety plan.",
        }),
    },
    KeywordCluster {
        id: "threats",
        category: PredictedRisk::Psychological,
        surface_forms: &[
            "pinagbantaan",
            "binantaan",
            "tinakot",
            "threatened",
            "intimidated",
            "intimidation",
        ],
        response: Some(ClusterResponse {
            child: "Refer the child for psychosocial intervention and interview the guardian about the source of the threats.",
            woman: "Record the threats, advise the victim to keep messages as evidence, and refer for counseling and a protection order.",
        }),
    },
    KeywordCluster {
        id: "verbal_abuse",
        category: PredictedRisk::Psychological,
        surface_forms: &[
            "minura",
            "minumura",
            "ininsulto",
            "sinigawan",
            "pinahiya",
            "verbal abuse",
            "verbally abused",
            "insulted",
            "humiliated",
        ],
        response: Some(ClusterResponse {
            child: "Refer the child to a guidance counselor or social worker for psychological first aid and monitor the home environment.",
            woman: "Refer the victim for psychological counseling and document repeated verbal abuse as psychological violence under RA 9262.",
        }),
    },
    KeywordCluster {
        id: "confinement",
        category: PredictedRisk::Psychological,
        surface_forms: &[
            "ikinulong",
            "ayaw palabasin",
            "pinagbawalang lumabas",
            "locked me in",
            "not allowed to go out",
            "isolated from family",
        ],
        response: Some(ClusterResponse {
            child: "Verify the child's whereabouts and schooling, and coordinate with the barangay for a home visit.",
            woman: "Coordinate a safe contact schedule with the victim, connect her with family or a shelter, and document the isolation.",
        }),
    },
    KeywordCluster {
        id: "stalking",
        category: PredictedRisk::Psychological,
        surface_forms: &["sinusundan", "ini-stalk", "stalking", "stalked", "harassment"],
        response: None,
    },
    KeywordCluster {
        id: "infidelity",
        category: PredictedRisk::Psychological,
        surface_forms: &["nambababae", "may kabit", "pangangaliwa", "infidelity", "mistress"],
        response: None,
    },
    // Physical
    KeywordCluster {
        id: "beating",
        category: PredictedRisk::Physical,
        surface_forms: &[
            "binugbog",
            "sinuntok",
            "sinampal",
            "sinipa",
            "hinampas",
            "beaten",
            "punched",
            "slapped",
            "kicked",
            "hit me",
        ],
        response: Some(ClusterResponse {
            child: "Bring the child for medical examination and injury documentation, and coordinate with the WCPD and DSWD for protective custody if needed.",
            woman: "Secure the victim's safety, arrange a medico-legal examination to document injuries, and assist with a Barangay Protection Order.",
        }),
    },
    KeywordCluster {
        id: "weapon",
        category: PredictedRisk::Physical,
        surface_forms: &[
            "sinaksak",
            "binaril",
            "tinutukan ng baril",
            "tinutukan ng kutsilyo",
            "stabbed",
            "shot at",
            "with a knife",
            "with a gun",
        ],
        response: Some(ClusterResponse {
            child: "Call emergency services and police immediately; the child needs urgent medical care and removal from the armed perpetrator.",
            woman: "Call emergency services and police immediately; ensure urgent medical care and remove the victim from contact with the armed perpetrator.",
        }),
    },
    KeywordCluster {
        id: "strangulation",
        category: PredictedRisk::Physical,
        surface_forms: &["sinakal", "sinasakal", "strangled", "choked"],
        response: Some(ClusterResponse {
            child: "Strangulation is life-threatening: send the child for urgent medical evaluation and notify the WCPD now.",
            woman: "Strangulation is a lethality indicator: arrange urgent medical evaluation and prioritize emergency shelter and a protection order.",
        }),
    },
    KeywordCluster {
        id: "injury",
        category: PredictedRisk::Physical,
        surface_forms: &["may pasa", "nagkapasa", "nasugatan", "bruises", "bruised", "injured", "wounded"],
        response: None,
    },
    KeywordCluster {
        id: "burning",
        category: PredictedRisk::Physical,
        surface_forms: &["pinaso", "sinunog", "burned me", "cigarette burn"],
        response: None,
    },
    // Sexual
    KeywordCluster {
        id: "rape",
        category: PredictedRisk::Sexual,
        surface_forms: &["ginahasa", "hinalay", "panggagahasa", "rape", "raped"],
        response: Some(ClusterResponse {
            child: "Refer the child immediately to the WCPD and a child protection unit for medico-legal examination; avoid repeated interviews.",
            woman: "Escort the survivor to a hospital or WCPD for medico-legal examination within 72 hours, preserve evidence, and provide psychosocial support.",
        }),
    },
    KeywordCluster {
        id: "molestation",
        category: PredictedRisk::Sexual,
        surface_forms: &["hinipuan", "hinihipuan", "minolestiya", "molested", "groped", "touched inappropriately"],
        response: Some(ClusterResponse {
            child: "Report to the WCPD and DSWD for child abuse investigation under RA 7610 and separate the child from the suspect.",
            woman: "Document the incident, refer the victim to the WCPD for filing of acts of lasciviousness, and offer counseling.",
        }),
    },
    KeywordCluster {
        id: "forced_intercourse",
        category: PredictedRisk::Sexual,
        surface_forms: &["pinilit makipagtalik", "pinilit akong makipagtalik", "forced sex", "forced intercourse"],
        response: Some(ClusterResponse {
            child: "Refer the child immediately to the WCPD and a child protection unit for medico-legal examination; avoid repeated interviews.",
            woman: "Provide immediate medical and psychosocial support and assist with filing marital or intimate-partner sexual violence charges.",
        }),
    },
    KeywordCluster {
        id: "sexual_harassment",
        category: PredictedRisk::Sexual,
        surface_forms: &["bastos na salita", "sexual harassment", "catcalling"],
        response: Some(ClusterResponse {
            child: "Notify the school or barangay child protection committee and document the harassment for a complaint under RA 11313.",
            woman: "Document the harassment and assist the victim in filing a complaint under the Safe Spaces Act (RA 11313).",
        }),
    },
    KeywordCluster {
        id: "online_exploitation",
        category: PredictedRisk::Sexual,
        surface_forms: &["cybersex", "hubad na litrato", "nude photos", "sextortion", "child pornography"],
        response: None,
    },
];

impl KeywordCluster {
    /// Cluster owning an exact surface form.
    pub fn for_phrase(phrase: &str) -> Option<&'static KeywordCluster> {
        KEYWORD_CLUSTERS
            .iter()
            .find(|cluster| cluster.surface_forms.iter().any(|form| *form == phrase))
    }
}

/// Every surface form of one category, in cluster order.
pub fn category_keywords(category: PredictedRisk) -> impl Iterator<Item = &'static str> {
    KEYWORD_CLUSTERS
        .iter()
        .filter(move |cluster| cluster.category == category)
        .flat_map(|cluster| cluster.surface_forms.iter().copied())
}
