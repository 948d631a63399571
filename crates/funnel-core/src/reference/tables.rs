//! Built-in province and city catalogs used when the live service is
//! unavailable.

use crate::backend::ReferenceRecord;

/// Id of the synthetic entry offered when no cities are known for a province.
pub const OTHER_ID: &str = "other";
pub const OTHER_NAME: &str = "Other";

const PROVINCES: &[(&str, &str)] = &[
    ("metro-manila", "Metro Manila"),
    ("cavite", "Cavite"),
    ("laguna", "Laguna"),
    ("bulacan", "Bulacan"),
    ("rizal", "Rizal"),
    ("pampanga", "Pampanga"),
    ("batangas", "Batangas"),
    ("cebu", "Cebu"),
    ("iloilo", "Iloilo"),
    ("davao-del-sur", "Davao del Sur"),
    ("benguet", "Benguet"),
    ("palawan", "Palawan"),
];

const CITIES: &[(&str, &[(&str, &str)])] = &[
    (
        "metro-manila",
        &[
            ("manila", "Manila"),
            ("quezon-city", "Quezon City"),
            ("makati", "Makati"),
            ("taguig", "Taguig"),
            ("pasig", "Pasig"),
            ("mandaluyong", "Mandaluyong"),
            ("paranaque", "Parañaque"),
            ("caloocan", "Caloocan"),
        ],
    ),
    (
        "cavite",
        &[
            ("bacoor", "Bacoor"),
            ("dasmarinas", "Dasmariñas"),
            ("imus", "Imus"),
            ("general-trias", "General Trias"),
        ],
    ),
    (
        "laguna",
        &[
            ("calamba", "Calamba"),
            ("santa-rosa", "Santa Rosa"),
            ("san-pedro", "San Pedro"),
            ("binan", "Biñan"),
        ],
    ),
    (
        "bulacan",
        &[
            ("malolos", "Malolos"),
            ("meycauayan", "Meycauayan"),
            ("san-jose-del-monte", "San Jose del Monte"),
        ],
    ),
    (
        "pampanga",
        &[("angeles", "Angeles"), ("san-fernando", "San Fernando")],
    ),
    (
        "cebu",
        &[
            ("cebu-city", "Cebu City"),
            ("mandaue", "Mandaue"),
            ("lapu-lapu", "Lapu-Lapu"),
            ("talisay", "Talisay"),
        ],
    ),
    ("iloilo", &[("iloilo-city", "Iloilo City"), ("passi", "Passi")]),
    (
        "davao-del-sur",
        &[("davao-city", "Davao City"), ("digos", "Digos")],
    ),
    ("benguet", &[("baguio", "Baguio")]),
];

/// Every built-in province.
pub fn provinces() -> Vec<ReferenceRecord> {
    PROVINCES
        .iter()
        .map(|(id, name)| ReferenceRecord::new(*id, *name))
        .collect()
}

/// Built-in cities for a province, or `None` if the table has no entry.
pub fn cities(province_id: &str) -> Option<Vec<ReferenceRecord>> {
    CITIES
        .iter()
        .find(|(province, _)| *province == province_id)
        .map(|(_, cities)| {
            cities
                .iter()
                .map(|(id, name)| ReferenceRecord::new(*id, *name))
                .collect()
        })
}

/// The single-entry list used when nothing better is known.
pub fn other() -> Vec<ReferenceRecord> {
    vec![ReferenceRecord::new(OTHER_ID, OTHER_NAME)]
}
