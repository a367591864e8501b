//! Cache key builders.
//!
//! Keys are colon-delimited strings. Every builder is deterministic, so the
//! same logical request always maps to the same key; list inputs are sorted
//! before joining.

use sha2::{Digest, Sha256};

pub fn city_key(name: &str) -> String {
    format!("city:{name}")
}

/// `recipes:{city}:{season}:{preferenceHash8}`; the hash segment is empty
/// when there is no preference text.
pub fn recipes_key(city: &str, season: &str, preference: &str) -> String {
    format!("recipes:{city}:{season}:{}", preference_hash(preference))
}

/// First 8 hex chars of the SHA-256 of the preference text, or `""`.
pub fn preference_hash(preference: &str) -> String {
    if preference.is_empty() {
        return String::new();
    }
    let digest = Sha256::digest(preference.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(8);
    hash
}

pub fn recipe_key(recipe_id: &str) -> String {
    format!("recipe:{recipe_id}")
}

pub fn detail_key(recipe_id: &str) -> String {
    format!("detail:{recipe_id}")
}

pub fn image_key(recipe_id: &str) -> String {
    format!("image:{recipe_id}")
}

pub fn status_key(recipe_id: &str) -> String {
    format!("status:{recipe_id}")
}

pub fn image_url_key(recipe_id: &str) -> String {
    format!("image-url:{recipe_id}")
}

/// `ingredients:{city}:{lang}:{month}` with the month as a decimal number.
pub fn ingredients_key(city: &str, lang: &str, month: u32) -> String {
    format!("ingredients:{city}:{lang}:{month}")
}

pub fn recipe_detail_key(recipe_id: &str) -> String {
    format!("recipe-detail:{recipe_id}")
}

pub fn ingredient_detail_key(ingredient_id: &str) -> String {
    format!("ingredient-detail:{ingredient_id}")
}

pub fn new_detail_key(recipe_id: &str) -> String {
    format!("new-detail:{recipe_id}")
}

/// `recipes-by-ingredients:{ids}`; the ids are sorted so any permutation of
/// the same set yields the same key.
pub fn recipes_by_ingredients_key<S: AsRef<str>>(ingredient_ids: &[S]) -> String {
    let mut ids: Vec<&str> = ingredient_ids.iter().map(AsRef::as_ref).collect();
    ids.sort_unstable();
    format!("recipes-by-ingredients:{}", ids.join(","))
}

/// Prefixes a key with a language code, e.g. `en:recipe-detail:r1`.
pub fn localized_key(lang: &str, key: &str) -> String {
    format!("{lang}:{key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_keys() {
        assert_eq!(city_key("北京"), "city:北京");
        assert_eq!(recipe_key("r1"), "recipe:r1");
        assert_eq!(detail_key("r1"), "detail:r1");
        assert_eq!(image_key("r1"), "image:r1");
        assert_eq!(status_key("r1"), "status:r1");
        assert_eq!(image_url_key("r1"), "image-url:r1");
        assert_eq!(recipe_detail_key("r1"), "recipe-detail:r1");
        assert_eq!(ingredient_detail_key("i9"), "ingredient-detail:i9");
        assert_eq!(new_detail_key("r1"), "new-detail:r1");
        assert_eq!(localized_key("en", &recipe_detail_key("r1")), "en:recipe-detail:r1");
    }

    #[test]
    fn test_recipes_key_without_preference() {
        assert_eq!(recipes_key("上海", "spring", ""), "recipes:上海:spring:");
    }

    #[test]
    fn test_recipes_key_with_preference() {
        let key = recipes_key("上海", "spring", "少辣");
        let hash = key.rsplit(':').next().unwrap();

        assert!(key.starts_with("recipes:上海:spring:"));
        assert_eq!(hash.len(), 8);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, recipes_key("上海", "spring", "少辣"));
        assert_ne!(key, recipes_key("上海", "spring", "多辣"));
    }

    #[test]
    fn test_ingredients_key_two_digit_month() {
        assert_eq!(ingredients_key("广州", "zh", 3), "ingredients:广州:zh:3");
        assert_eq!(ingredients_key("广州", "zh", 11), "ingredients:广州:zh:11");
    }

    #[test]
    fn test_recipes_by_ingredients_order_independent() {
        let a = recipes_by_ingredients_key(&["蛋", "葱"]);
        let b = recipes_by_ingredients_key(&["葱", "蛋"]);
        assert_eq!(a, b);

        let owned = vec!["葱".to_string(), "蛋".to_string()];
        assert_eq!(recipes_by_ingredients_key(&owned), a);
    }

    #[test]
    fn test_recipes_by_ingredients_distinct_sets() {
        assert_ne!(
            recipes_by_ingredients_key(&["蛋", "葱"]),
            recipes_by_ingredients_key(&["蛋", "韭菜"])
        );
        assert_eq!(
            recipes_by_ingredients_key::<&str>(&[]),
            "recipes-by-ingredients:"
        );
    }
}
