//! Built-in offline catalog backed by the Khronos glTF-Sample-Assets set.
//!
//! A small fixed table of known-good GLB files plus keyword aliases for
//! common terms the table has no literal entry for ("dog" has no sample
//! asset, so it maps to the fox). Served from GitHub raw URLs, which are
//! CORS-enabled and need no proxying.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::debug;

use super::{AssetCandidate, ModelCatalog, SearchOutcome};

const SAMPLE_ASSETS_BASE: &str =
    "https://raw.githubusercontent.com/KhronosGroup/glTF-Sample-Assets/main/Models";

fn entry(asset: &str, title: &str, category: &str) -> AssetCandidate {
    AssetCandidate {
        id: asset.to_lowercase(),
        title: title.to_string(),
        author: "Khronos Group".to_string(),
        download_url: format!("{SAMPLE_ASSETS_BASE}/{asset}/glTF-Binary/{asset}.glb"),
        thumbnail: String::new(),
        license: "CC0".to_string(),
        category: Some(category.to_string()),
    }
}

static MODELS: Lazy<BTreeMap<&'static str, AssetCandidate>> = Lazy::new(|| {
    BTreeMap::from([
        // Animals
        ("fox", entry("Fox", "Fox", "animal")),
        ("duck", entry("Duck", "Duck", "animal")),
        ("fish", entry("BarramundiFish", "Barramundi Fish", "animal")),
        ("mosquito", entry("MosquitoInAmber", "Mosquito in Amber", "animal")),
        // People
        ("man", entry("CesiumMan", "Walking Man", "character")),
        ("person", entry("CesiumMan", "Walking Man", "character")),
        ("human", entry("CesiumMan", "Walking Man", "character")),
        ("figure", entry("RiggedFigure", "Human Figure", "character")),
        // Vehicles
        ("car", entry("ToyCar", "Toy Car", "vehicle")),
        ("truck", entry("CesiumMilkTruck", "Milk Truck", "vehicle")),
        // Furniture
        ("chair", entry("SheenChair", "Sheen Chair", "furniture")),
        ("sofa", entry("GlamVelvetSofa", "Velvet Sofa", "furniture")),
        ("couch", entry("GlamVelvetSofa", "Velvet Sofa", "furniture")),
        ("ottoman", entry("SpecularSilkPouf", "Silk Pouf", "furniture")),
        ("pouf", entry("SpecularSilkPouf", "Silk Pouf", "furniture")),
        // Nature
        ("plant", entry("DiffuseTransmissionPlant", "Plant", "nature")),
        ("flower", entry("GlassVaseFlowers", "Flowers in Vase", "nature")),
        ("flowers", entry("GlassVaseFlowers", "Flowers in Vase", "nature")),
        ("vase", entry("GlassVaseFlowers", "Flowers in Vase", "nature")),
        // Food
        ("avocado", entry("Avocado", "Avocado", "food")),
        ("orange", entry("MandarinOrange", "Mandarin Orange", "food")),
        ("fruit", entry("MandarinOrange", "Mandarin Orange", "food")),
        ("olives", entry("IridescentDishWithOlives", "Dish with Olives", "food")),
        // Objects
        ("lantern", entry("Lantern", "Lantern", "object")),
        ("lamp", entry("StainedGlassLamp", "Stained Glass Lamp", "object")),
        ("light", entry("Lantern", "Lantern", "object")),
        ("bottle", entry("WaterBottle", "Water Bottle", "object")),
        ("camera", entry("AntiqueCamera", "Antique Camera", "object")),
        ("watch", entry("ChronographWatch", "Chronograph Watch", "object")),
        ("clock", entry("ChronographWatch", "Chronograph Watch", "object")),
        ("shoe", entry("MaterialsVariantsShoe", "Shoe", "object")),
        ("sunglasses", entry("SunglassesKhronos", "Sunglasses", "object")),
        ("glasses", entry("SunglassesKhronos", "Sunglasses", "object")),
        ("boombox", entry("BoomBox", "Boom Box", "object")),
        ("radio", entry("BoomBox", "Boom Box", "object")),
        ("speaker", entry("BoomBox", "Boom Box", "object")),
        ("music", entry("BoomBox", "Boom Box", "object")),
        ("candle", entry("GlassHurricaneCandleHolder", "Candle Holder", "object")),
        ("window", entry("GlassBrokenWindow", "Broken Window", "object")),
        ("pot", entry("PotOfCoals", "Pot of Coals", "object")),
        ("fire", entry("PotOfCoals", "Pot of Coals", "object")),
        // Helmets
        ("helmet", entry("DamagedHelmet", "Damaged Helmet", "armor")),
        ("pilot", entry("FlightHelmet", "Flight Helmet", "armor")),
        ("armor", entry("DamagedHelmet", "Damaged Helmet", "armor")),
        // Fantasy
        ("dragon", entry("DragonAttenuation", "Dragon", "fantasy")),
        // Science
        ("brain", entry("BrainStem", "Brain Stem", "science")),
        ("skull", entry("ScatteringSkull", "Skull", "science")),
        ("anatomy", entry("BrainStem", "Brain Stem", "science")),
        // Architecture
        ("sponza", entry("Sponza", "Sponza Palace", "architecture")),
        ("palace", entry("Sponza", "Sponza Palace", "architecture")),
        ("building", entry("Sponza", "Sponza Palace", "architecture")),
        // Other
        ("monkey", entry("Suzanne", "Suzanne (Monkey)", "character")),
        ("corset", entry("Corset", "Corset", "fashion")),
        ("cloth", entry("SheenCloth", "Sheen Cloth", "material")),
        ("fabric", entry("SheenCloth", "Sheen Cloth", "material")),
        ("refrigerator", entry("CommercialRefrigerator", "Refrigerator", "appliance")),
        ("fridge", entry("CommercialRefrigerator", "Refrigerator", "appliance")),
    ])
});

/// Common terms with no literal entry above.
static ALIASES: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("dog", "fox"),
        ("cat", "fox"),
        ("wolf", "fox"),
        ("animal", "fox"),
        ("pet", "fox"),
        ("bird", "duck"),
        ("chicken", "duck"),
        ("water", "bottle"),
        ("drink", "bottle"),
        ("seat", "chair"),
        ("furniture", "chair"),
        ("vehicle", "car"),
        ("automobile", "car"),
        ("tree", "plant"),
        ("nature", "plant"),
        ("food", "avocado"),
        ("warrior", "helmet"),
        ("knight", "helmet"),
        ("soldier", "helmet"),
        ("battle", "helmet"),
        ("medieval", "helmet"),
        ("science", "brain"),
        ("organ", "brain"),
        ("head", "skull"),
        ("bone", "skull"),
        ("skeleton", "skull"),
        ("monster", "dragon"),
        ("creature", "dragon"),
        ("dinosaur", "dragon"),
        ("ape", "monkey"),
        ("primate", "monkey"),
        ("gorilla", "monkey"),
        ("room", "sponza"),
        ("architecture", "sponza"),
        ("interior", "sponza"),
        ("time", "watch"),
        ("wristwatch", "watch"),
        ("photo", "camera"),
        ("photography", "camera"),
        ("appliance", "refrigerator"),
        ("kitchen", "refrigerator"),
        ("insect", "mosquito"),
        ("bug", "mosquito"),
    ])
});

pub struct BuiltinCatalog;

#[async_trait]
impl ModelCatalog for BuiltinCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<SearchOutcome> {
        Ok(lookup(query, limit))
    }
}

fn lookup(query: &str, limit: usize) -> SearchOutcome {
    let normalized: String = query
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    let mut hits: Vec<&AssetCandidate> = Vec::new();

    // Direct entry, then alias, then partial matches in both directions.
    if let Some(asset) = MODELS.get(normalized.as_str()) {
        hits.push(asset);
    }
    if let Some(key) = ALIASES.get(normalized.as_str())
        && let Some(asset) = MODELS.get(key)
    {
        hits.push(asset);
    }
    if !normalized.is_empty() {
        for (key, asset) in MODELS.iter() {
            if key.contains(normalized.as_str()) || normalized.contains(key) {
                hits.push(asset);
            }
        }
        for (word, key) in ALIASES.iter() {
            if (word.contains(normalized.as_str()) || normalized.contains(word))
                && let Some(asset) = MODELS.get(key)
            {
                hits.push(asset);
            }
        }
    }

    // Aliased entries share URLs; report each asset once.
    let mut models: Vec<AssetCandidate> = Vec::new();
    for hit in hits {
        if !models.iter().any(|m| m.download_url == hit.download_url) {
            models.push(hit.clone());
        }
        if models.len() == limit {
            break;
        }
    }

    debug!(query, matches = models.len(), "built-in catalog lookup");
    SearchOutcome {
        total: models.len(),
        models,
        query: normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_entry_is_first() {
        let outcome = lookup("fox", 8);
        assert_eq!(outcome.models[0].title, "Fox");
    }

    #[test]
    fn alias_maps_dog_to_fox() {
        let outcome = lookup("dog", 8);
        assert_eq!(outcome.models[0].title, "Fox");
    }

    #[test]
    fn alias_maps_tree_to_plant() {
        let outcome = lookup("tree", 8);
        assert_eq!(outcome.models[0].title, "Plant");
    }

    #[test]
    fn unknown_terms_return_empty() {
        let outcome = lookup("zzgxq", 8);
        assert!(outcome.models.is_empty());
        assert_eq!(outcome.total, 0);
    }

    #[test]
    fn punctuation_and_case_are_normalized() {
        let outcome = lookup("  Fox! ", 8);
        assert_eq!(outcome.models[0].title, "Fox");
        assert_eq!(outcome.query, "fox");
    }

    #[test]
    fn partial_matches_are_found() {
        // The entry key "fridge" is contained in "fridges".
        let outcome = lookup("fridges", 8);
        assert_eq!(outcome.models[0].title, "Refrigerator");
    }

    #[test]
    fn results_are_deduplicated_and_capped() {
        // "light" matches the lantern entry directly and again via partials.
        let outcome = lookup("light", 2);
        assert!(outcome.models.len() <= 2);
        let unique: std::collections::HashSet<_> =
            outcome.models.iter().map(|m| &m.download_url).collect();
        assert_eq!(unique.len(), outcome.models.len());
    }

    #[test]
    fn empty_query_returns_empty() {
        let outcome = lookup("", 8);
        assert!(outcome.models.is_empty());
    }
}
