//! Typed facade over the cache manager.
//!
//! Pairs each domain entity with its key builder. Models belong to the
//! calling services, so values are generic serde types; everything is stored
//! as JSON through the two-tier manager.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cache::{keys, CacheManager};
use crate::error::Result;

/// Progress of a recipe's image generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Pending,
    Generating,
    Ready,
    Failed,
}

/// Domain-level cache handle; cloning shares the same manager.
#[derive(Debug, Clone)]
pub struct RecipeCache {
    manager: Arc<CacheManager>,
}

impl RecipeCache {
    pub fn new(manager: Arc<CacheManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<CacheManager> {
        &self.manager
    }

    // == City ==
    pub fn get_city<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.manager.get_json(&keys::city_key(name))
    }

    pub fn set_city<T: Serialize>(&self, name: &str, city: &T) -> Result<()> {
        self.manager.set_json(&keys::city_key(name), city)
    }

    // == Recipe lists ==
    pub fn get_recipes<T: DeserializeOwned>(
        &self,
        city: &str,
        season: &str,
        preference: &str,
    ) -> Option<Vec<T>> {
        self.manager
            .get_json(&keys::recipes_key(city, season, preference))
    }

    pub fn set_recipes<T: Serialize>(
        &self,
        city: &str,
        season: &str,
        preference: &str,
        recipes: &[T],
    ) -> Result<()> {
        self.manager
            .set_json(&keys::recipes_key(city, season, preference), recipes)
    }

    pub fn get_recipes_by_ingredients<T: DeserializeOwned, S: AsRef<str>>(
        &self,
        ingredient_ids: &[S],
    ) -> Option<Vec<T>> {
        self.manager
            .get_json(&keys::recipes_by_ingredients_key(ingredient_ids))
    }

    pub fn set_recipes_by_ingredients<T: Serialize, S: AsRef<str>>(
        &self,
        ingredient_ids: &[S],
        recipes: &[T],
    ) -> Result<()> {
        self.manager
            .set_json(&keys::recipes_by_ingredients_key(ingredient_ids), recipes)
    }

    // == Single recipe ==
    pub fn get_recipe<T: DeserializeOwned>(&self, recipe_id: &str) -> Option<T> {
        self.manager.get_json(&keys::recipe_key(recipe_id))
    }

    pub fn set_recipe<T: Serialize>(&self, recipe_id: &str, recipe: &T) -> Result<()> {
        self.manager.set_json(&keys::recipe_key(recipe_id), recipe)
    }

    /// Stores a recipe, its image status and, when present, its image.
    ///
    /// Stops at the first failed write.
    pub fn store_recipe<T: Serialize>(
        &self,
        recipe_id: &str,
        recipe: &T,
        status: ImageStatus,
        image_base64: Option<&str>,
    ) -> Result<()> {
        self.set_recipe(recipe_id, recipe)?;
        self.set_image_status(recipe_id, status)?;
        match image_base64 {
            Some(image) if !image.is_empty() => self.set_image_base64(recipe_id, image),
            _ => Ok(()),
        }
    }

    // == Details ==
    pub fn get_recipe_detail<T: DeserializeOwned>(&self, recipe_id: &str) -> Option<T> {
        self.manager.get_json(&keys::detail_key(recipe_id))
    }

    pub fn set_recipe_detail<T: Serialize>(&self, recipe_id: &str, detail: &T) -> Result<()> {
        self.manager.set_json(&keys::detail_key(recipe_id), detail)
    }

    /// Detail produced by the ingredient-first flow, cached per language.
    pub fn get_localized_recipe_detail<T: DeserializeOwned>(
        &self,
        lang: &str,
        recipe_id: &str,
    ) -> Option<T> {
        let key = keys::localized_key(lang, &keys::recipe_detail_key(recipe_id));
        self.manager.get_json(&key)
    }

    pub fn set_localized_recipe_detail<T: Serialize>(
        &self,
        lang: &str,
        recipe_id: &str,
        detail: &T,
    ) -> Result<()> {
        let key = keys::localized_key(lang, &keys::recipe_detail_key(recipe_id));
        self.manager.set_json(&key, detail)
    }

    pub fn get_new_recipe_detail<T: DeserializeOwned>(&self, recipe_id: &str) -> Option<T> {
        self.manager.get_json(&keys::new_detail_key(recipe_id))
    }

    pub fn set_new_recipe_detail<T: Serialize>(&self, recipe_id: &str, detail: &T) -> Result<()> {
        self.manager.set_json(&keys::new_detail_key(recipe_id), detail)
    }

    // == Images ==
    pub fn get_image_base64(&self, recipe_id: &str) -> Option<String> {
        self.manager.get_json(&keys::image_key(recipe_id))
    }

    pub fn set_image_base64(&self, recipe_id: &str, image: &str) -> Result<()> {
        self.manager.set_json(&keys::image_key(recipe_id), image)
    }

    pub fn get_image_status(&self, recipe_id: &str) -> Option<ImageStatus> {
        self.manager.get_json(&keys::status_key(recipe_id))
    }

    pub fn set_image_status(&self, recipe_id: &str, status: ImageStatus) -> Result<()> {
        self.manager.set_json(&keys::status_key(recipe_id), &status)
    }

    pub fn get_image_url(&self, recipe_id: &str) -> Option<String> {
        self.manager.get_json(&keys::image_url_key(recipe_id))
    }

    pub fn set_image_url(&self, recipe_id: &str, url: &str) -> Result<()> {
        self.manager.set_json(&keys::image_url_key(recipe_id), url)
    }

    // == Ingredients ==
    pub fn get_ingredients<T: DeserializeOwned>(
        &self,
        city: &str,
        lang: &str,
        month: u32,
    ) -> Option<T> {
        self.manager
            .get_json(&keys::ingredients_key(city, lang, month))
    }

    pub fn set_ingredients<T: Serialize>(
        &self,
        city: &str,
        lang: &str,
        month: u32,
        ingredients: &T,
    ) -> Result<()> {
        self.manager
            .set_json(&keys::ingredients_key(city, lang, month), ingredients)
    }

    pub fn get_ingredient_detail<T: DeserializeOwned>(&self, ingredient_id: &str) -> Option<T> {
        self.manager
            .get_json(&keys::ingredient_detail_key(ingredient_id))
    }

    pub fn set_ingredient_detail<T: Serialize>(&self, ingredient_id: &str, detail: &T) -> Result<()> {
        self.manager
            .set_json(&keys::ingredient_detail_key(ingredient_id), detail)
    }
}
