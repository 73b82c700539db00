//! Country to continent lookup for affiliation countries.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Continent {
    Africa,
    Asia,
    Europe,
    NorthAmerica,
    SouthAmerica,
    Oceania,
}

impl Continent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Africa => "Africa",
            Self::Asia => "Asia",
            Self::Europe => "Europe",
            Self::NorthAmerica => "North America",
            Self::SouthAmerica => "South America",
            Self::Oceania => "Oceania",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Continent of a country as Scopus spells it in affiliation records.
///
/// Case and diacritics are ignored. Unknown names give `None`.
pub fn continent_of(country: &str) -> Option<Continent> {
    use Continent::*;

    let key = deunicode::deunicode(country.trim()).to_lowercase();
    let continent = match key.as_str() {
        // Africa
        "algeria" | "angola" | "benin" | "botswana" | "burkina faso" | "burundi" | "cameroon"
        | "cape verde" | "central african republic" | "chad" | "comoros" | "congo"
        | "democratic republic congo" | "democratic republic of the congo" | "cote d'ivoire"
        | "ivory coast" | "djibouti" | "egypt" | "equatorial guinea" | "eritrea" | "eswatini"
        | "swaziland" | "ethiopia" | "gabon" | "gambia" | "ghana" | "guinea" | "guinea-bissau"
        | "kenya" | "lesotho" | "liberia" | "libya" | "libyan arab jamahiriya" | "madagascar"
        | "malawi" | "mali" | "mauritania" | "mauritius" | "morocco" | "mozambique" | "namibia"
        | "niger" | "nigeria" | "reunion" | "rwanda" | "senegal" | "seychelles" | "sierra leone"
        | "somalia" | "south africa" | "south sudan" | "sudan" | "tanzania"
        | "united republic of tanzania" | "togo" | "tunisia" | "uganda" | "zambia" | "zimbabwe" => {
            Africa
        }
        // Asia
        "afghanistan" | "armenia" | "azerbaijan" | "bahrain" | "bangladesh" | "bhutan" | "brunei"
        | "brunei darussalam" | "cambodia" | "china" | "georgia" | "hong kong" | "india"
        | "indonesia" | "iran" | "islamic republic of iran" | "iraq" | "israel" | "japan"
        | "jordan" | "kazakhstan" | "kuwait" | "kyrgyzstan" | "laos" | "lebanon" | "macao"
        | "macau" | "malaysia" | "maldives" | "mongolia" | "myanmar" | "nepal" | "north korea"
        | "oman" | "pakistan" | "palestine" | "philippines" | "qatar" | "saudi arabia"
        | "singapore" | "south korea" | "korea" | "republic of korea" | "sri lanka" | "syria"
        | "syrian arab republic" | "taiwan" | "tajikistan" | "thailand" | "timor-leste"
        | "turkey" | "turkiye" | "turkmenistan" | "united arab emirates" | "uzbekistan"
        | "viet nam" | "vietnam" | "yemen" => Asia,
        // Europe
        "albania" | "andorra" | "austria" | "belarus" | "belgium" | "bosnia and herzegovina"
        | "bulgaria" | "croatia" | "cyprus" | "czech republic" | "czechia" | "denmark"
        | "estonia" | "faroe islands" | "finland" | "france" | "germany" | "greece"
        | "greenland" | "hungary" | "iceland" | "ireland" | "italy" | "kosovo" | "latvia"
        | "liechtenstein" | "lithuania" | "luxembourg" | "malta" | "moldova"
        | "republic of moldova" | "monaco" | "montenegro" | "netherlands" | "north macedonia"
        | "macedonia" | "norway" | "poland" | "portugal" | "romania" | "russia"
        | "russian federation" | "san marino" | "serbia" | "slovakia" | "slovenia" | "spain"
        | "sweden" | "switzerland" | "ukraine" | "united kingdom" | "vatican city" => Europe,
        // North America, Central America and the Caribbean
        "antigua and barbuda" | "bahamas" | "barbados" | "belize" | "bermuda" | "canada"
        | "costa rica" | "cuba" | "dominica" | "dominican republic" | "el salvador" | "grenada"
        | "guadeloupe" | "guatemala" | "haiti" | "honduras" | "jamaica" | "martinique"
        | "mexico" | "nicaragua" | "panama" | "puerto rico" | "saint kitts and nevis"
        | "saint lucia" | "trinidad and tobago" | "united states" | "usa" => NorthAmerica,
        // South America
        "argentina" | "bolivia" | "brazil" | "chile" | "colombia" | "ecuador" | "french guiana"
        | "guyana" | "paraguay" | "peru" | "suriname" | "uruguay" | "venezuela" => SouthAmerica,
        // Oceania
        "australia" | "fiji" | "french polynesia" | "guam" | "kiribati" | "new caledonia"
        | "new zealand" | "papua new guinea" | "samoa" | "solomon islands" | "tonga"
        | "vanuatu" => Oceania,
        _ => return None,
    };
    Some(continent)
}
