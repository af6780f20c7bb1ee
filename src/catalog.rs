// src/catalog.rs
//! Static lookup tables served to clients: sites, job types, countries.

use serde::Serialize;

use crate::search::JobType;
use crate::sources::SourceId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupEntry {
    pub value: &'static str,
    pub label: &'static str,
}

const fn entry(value: &'static str, label: &'static str) -> LookupEntry {
    LookupEntry { value, label }
}

pub const SITES: &[LookupEntry] = &[
    entry("linkedin", "LinkedIn"),
    entry("indeed", "Indeed"),
    entry("zip_recruiter", "ZipRecruiter"),
    entry("glassdoor", "Glassdoor"),
    entry("google", "Google Jobs"),
    entry("bayt", "Bayt"),
    entry("naukri", "Naukri"),
    entry("bdjobs", "BDJobs"),
];

pub const COUNTRIES: &[LookupEntry] = &[
    entry("argentina", "Argentina"),
    entry("australia", "Australia"),
    entry("austria", "Austria"),
    entry("bahrain", "Bahrain"),
    entry("bangladesh", "Bangladesh"),
    entry("belgium", "Belgium"),
    entry("brazil", "Brazil"),
    entry("bulgaria", "Bulgaria"),
    entry("canada", "Canada"),
    entry("chile", "Chile"),
    entry("china", "China"),
    entry("colombia", "Colombia"),
    entry("costa rica", "Costa Rica"),
    entry("croatia", "Croatia"),
    entry("cyprus", "Cyprus"),
    entry("czech republic", "Czech Republic"),
    entry("denmark", "Denmark"),
    entry("ecuador", "Ecuador"),
    entry("egypt", "Egypt"),
    entry("estonia", "Estonia"),
    entry("finland", "Finland"),
    entry("france", "France"),
    entry("germany", "Germany"),
    entry("greece", "Greece"),
    entry("hong kong", "Hong Kong"),
    entry("hungary", "Hungary"),
    entry("india", "India"),
    entry("indonesia", "Indonesia"),
    entry("ireland", "Ireland"),
    entry("israel", "Israel"),
    entry("italy", "Italy"),
    entry("japan", "Japan"),
    entry("kuwait", "Kuwait"),
    entry("latvia", "Latvia"),
    entry("lithuania", "Lithuania"),
    entry("luxembourg", "Luxembourg"),
    entry("malaysia", "Malaysia"),
    entry("malta", "Malta"),
    entry("mexico", "Mexico"),
    entry("morocco", "Morocco"),
    entry("netherlands", "Netherlands"),
    entry("new zealand", "New Zealand"),
    entry("nigeria", "Nigeria"),
    entry("norway", "Norway"),
    entry("oman", "Oman"),
    entry("pakistan", "Pakistan"),
    entry("panama", "Panama"),
    entry("peru", "Peru"),
    entry("philippines", "Philippines"),
    entry("poland", "Poland"),
    entry("portugal", "Portugal"),
    entry("qatar", "Qatar"),
    entry("romania", "Romania"),
    entry("saudi arabia", "Saudi Arabia"),
    entry("singapore", "Singapore"),
    entry("slovakia", "Slovakia"),
    entry("slovenia", "Slovenia"),
    entry("south africa", "South Africa"),
    entry("south korea", "South Korea"),
    entry("spain", "Spain"),
    entry("sweden", "Sweden"),
    entry("switzerland", "Switzerland"),
    entry("taiwan", "Taiwan"),
    entry("thailand", "Thailand"),
    entry("turkey", "Turkey"),
    entry("ukraine", "Ukraine"),
    entry("united arab emirates", "United Arab Emirates"),
    entry("uk", "UK"),
    entry("usa", "USA"),
    entry("uruguay", "Uruguay"),
    entry("venezuela", "Venezuela"),
    entry("vietnam", "Vietnam"),
];

pub fn site_ids() -> Vec<SourceId> {
    SITES.iter().map(|s| SourceId::from(s.value)).collect()
}

pub fn country_values() -> Vec<&'static str> {
    COUNTRIES.iter().map(|c| c.value).collect()
}

pub fn job_types() -> Vec<LookupEntry> {
    JobType::ALL
        .into_iter()
        .map(|jt| {
            let label = match jt {
                JobType::Fulltime => "Full Time",
                JobType::Parttime => "Part Time",
                JobType::Contract => "Contract",
                JobType::Internship => "Internship",
            };
            entry(jt.as_str(), label)
        })
        .collect()
}

/// Countries ordered by display label.
pub fn countries_by_label() -> Vec<LookupEntry> {
    let mut out = COUNTRIES.to_vec();
    out.sort_by(|a, b| a.label.cmp(b.label));
    out
}
