//! Default area lists used when no `--areas` override is given.

pub const AREAS: &[&str] = &[
    "Arugam Bay",
    "Nuwara Eliya",
    "Kandy",
    "Kataragama",
    "Anuradhapura",
    "Polonnaruwa",
    "Sigiriya",
    "Trincomalee",
    "Jaffna",
    "Kalpitiya",
    "Passikudah",
    "Bentota",
    "Haputale",
    "Matara",
    "Puttalam",
    "Weligama",
    "Badulla",
    "Hambantota",
    "Diyatalawa",
    "Negombo",
    "Ella",
    "Hikkaduwa",
    "Galle",
    "Bandarawela",
    "Ratnapura",
    "Knuckles",
    "Kitulgala",
    "Tangalle",
    "Maskeliya",
    "Mannar",
    "Mirissa",
    "Pottuvil",
    "Mullaitivu",
    "Dambulla",
    "Avissawella",
    "Kalutara",
    "Deniyaya",
    "Monaragala",
    "Tissamaharama",
    "Sella Kataragama",
    "Colombo",
    "Gampaha",
    "Dodanduwa",
    "Horton Plains",
    "Sinharaja",
    "Chilaw",
    "Matale",
    "Kurunegala",
    "Ambalangoda",
];

/// Districts and the major areas searched within each.
pub const DISTRICT_AREAS: &[(&str, &[&str])] = &[
    ("Colombo", &["Colombo", "Dehiwala", "Mount Lavinia", "Pettah", "Fort"]),
    ("Gampaha", &["Gampaha", "Negombo", "Katunayake", "Ja-Ela", "Wattala", "Kandana"]),
    ("Kalutara", &["Kalutara", "Panadura", "Beruwala", "Aluthgama", "Wadduwa", "Horana"]),
    ("Kandy", &["Kandy", "Peradeniya", "Gampola", "Kundasale", "Kadugannawa", "Nawalapitiya"]),
    ("Matale", &["Matale", "Dambulla", "Sigiriya", "Naula", "Rattota", "Palapathwela"]),
    ("Nuwara Eliya", &["Nuwara Eliya", "Horton Plains", "Ella", "Talawakele", "Hatton", "Ragala"]),
    ("Galle", &["Galle", "Hikkaduwa", "Unawatuna", "Ambalangoda", "Bentota", "Ahangama"]),
    ("Matara", &["Matara", "Weligama", "Mirissa", "Dikwella", "Hambantota", "Tangalle"]),
    ("Hambantota", &["Hambantota", "Tangalle", "Tissamaharama", "Ambalantota", "Bundala", "Kataragama"]),
    ("Jaffna", &["Jaffna", "Nallur", "Point Pedro", "Chavakachcheri", "Karainagar", "Delft"]),
    ("Kilinochchi", &["Kilinochchi", "Pallai", "Paranthan", "Kandavalai"]),
    ("Mannar", &["Mannar", "Talaimannar", "Madhu", "Nanattan"]),
    ("Vavuniya", &["Vavuniya", "Cheddikulam", "Nedunkeni", "Omanthai"]),
    ("Mullaitivu", &["Mullaitivu", "Puthukudiyiruppu", "Oddusuddan", "Alampil"]),
    ("Batticaloa", &["Batticaloa", "Kalkudah", "Pasikudah", "Valaichchenai", "Kattankudy", "Eravur"]),
    ("Ampara", &["Ampara", "Arugam Bay", "Pottuvil", "Sainthamaruthu", "Kalmunai", "Sammanthurai"]),
    ("Trincomalee", &["Trincomalee", "Nilaveli", "Kuchchaveli", "Kinniya", "Seruwila", "Gomarankadawala"]),
    ("Kurunegala", &["Kurunegala", "Puttalam", "Chilaw", "Kuliyapitiya", "Narammala", "Polgahawela"]),
    ("Puttalam", &["Puttalam", "Kalpitiya", "Chilaw", "Anamaduwa", "Wennappuwa", "Madampe"]),
    ("Anuradhapura", &["Anuradhapura", "Mihintale", "Thanthirimale", "Kekirawa", "Nochchiyagama", "Rambewa"]),
    ("Polonnaruwa", &["Polonnaruwa", "Hingurakgoda", "Kaduruwela", "Medirigiriya", "Lankapura", "Dimbulagala"]),
    ("Badulla", &["Badulla", "Bandarawela", "Ella", "Haputale", "Passara", "Welimada"]),
    ("Monaragala", &["Monaragala", "Sella Kataragama", "Wellawaya", "Bibile", "Buttala", "Kataragama"]),
    ("Ratnapura", &["Ratnapura", "Sinharaja", "Balangoda", "Embilipitiya", "Kuruwita", "Eheliyagoda"]),
    ("Kegalle", &["Kegalle", "Pinnawala", "Mawanella", "Rambukkana", "Warakapola", "Ruwanwella"]),
];

pub fn default_areas() -> Vec<String> {
    AREAS.iter().map(|a| a.to_string()).collect()
}

/// `(district, area)` pairs in declaration order.
pub fn district_area_pairs() -> Vec<(String, String)> {
    DISTRICT_AREAS
        .iter()
        .flat_map(|(district, areas)| {
            areas
                .iter()
                .map(move |area| (district.to_string(), area.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_district_is_listed_once() {
        assert_eq!(DISTRICT_AREAS.len(), 25);
        let pairs = district_area_pairs();
        assert_eq!(pairs[0], ("Colombo".to_string(), "Colombo".to_string()));
        assert_eq!(pairs.last().unwrap().1, "Ruwanwella");
    }

    #[test]
    fn default_areas_have_no_duplicates() {
        let mut areas = default_areas();
        let n = areas.len();
        areas.sort();
        areas.dedup();
        assert_eq!(areas.len(), n);
    }
}
