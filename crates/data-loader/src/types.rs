//! Core domain types for rating datasets.
//!
//! Two leaf collections feed every recommendation strategy:
//! - [`RatingStore`]: per-user, per-item rating observations
//! - [`ItemCatalog`]: item metadata (title, tag text)
//!
//! Both remember first-seen order. Matrix row/column numbering and the
//! evaluation sample are derived from that order, so it is part of the
//! contract and not an implementation detail.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Opaque user identifier, kept exactly as it appears in the ratings file
pub type UserId = String;

/// Opaque item identifier, kept exactly as it appears in the item file
pub type ItemId = String;

// =============================================================================
// Item Catalog
// =============================================================================

/// An item in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    /// Raw tag text. Movies carry pipe-separated genres ("Action|Comedy"),
    /// books carry the author name.
    pub tags: String,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, tags: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            tags: tags.into(),
        }
    }

    /// Tag text with the multi-value separator replaced by whitespace
    pub fn normalized_tags(&self) -> String {
        self.tags.replace('|', " ")
    }
}

/// Item metadata keyed by item id, iterated in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemCatalog {
    order: Vec<ItemId>,
    items: HashMap<ItemId, Item>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item. Re-inserting an existing id replaces its metadata
    /// but keeps its original position.
    pub fn insert(&mut self, item: Item) {
        if !self.items.contains_key(&item.id) {
            self.order.push(item.id.clone());
        }
        self.items.insert(item.id.clone(), item);
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Item ids in first-seen order
    pub fn ids(&self) -> &[ItemId] {
        &self.order
    }

    /// Items in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.order.iter().filter_map(move |id| self.items.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// =============================================================================
// Rating Store
// =============================================================================

/// A single (user, item, value) observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub value: f32,
}

impl RatingEntry {
    pub fn new(user_id: impl Into<UserId>, item_id: impl Into<ItemId>, value: f32) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            value,
        }
    }
}

/// All ratings of one user, in the order they were first recorded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRatings {
    entries: Vec<(ItemId, f32)>,
    positions: HashMap<ItemId, usize>,
}

impl UserRatings {
    /// Record a rating. A repeated item overwrites the value in place.
    fn upsert(&mut self, item_id: ItemId, value: f32) {
        match self.positions.get(&item_id) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.positions.insert(item_id.clone(), self.entries.len());
                self.entries.push((item_id, value));
            }
        }
    }

    pub fn get(&self, item_id: &str) -> Option<f32> {
        self.positions.get(item_id).map(|&pos| self.entries[pos].1)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.positions.contains_key(item_id)
    }

    /// (item, value) pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, f32)> {
        self.entries.iter().map(|(id, value)| (id, *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arithmetic mean of the recorded values, `None` when there are none
    pub fn mean(&self) -> Option<f32> {
        if self.entries.is_empty() {
            return None;
        }
        let total: f32 = self.entries.iter().map(|(_, v)| v).sum();
        Some(total / self.entries.len() as f32)
    }
}

/// Raw rating observations keyed by user, iterated in first-seen order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingStore {
    order: Vec<UserId>,
    ratings: HashMap<UserId, UserRatings>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rating, creating the user on first sight
    pub fn insert(&mut self, entry: RatingEntry) {
        let RatingEntry {
            user_id,
            item_id,
            value,
        } = entry;
        if !self.ratings.contains_key(&user_id) {
            self.order.push(user_id.clone());
        }
        self.ratings.entry(user_id).or_default().upsert(item_id, value);
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.ratings.contains_key(user_id)
    }

    /// Ratings made by a user
    pub fn get_user_ratings(&self, user_id: &str) -> Option<&UserRatings> {
        self.ratings.get(user_id)
    }

    /// User ids in first-seen order
    pub fn user_ids(&self) -> &[UserId] {
        &self.order
    }

    /// (user, ratings) pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &UserRatings)> {
        self.order
            .iter()
            .filter_map(move |id| self.ratings.get(id).map(|r| (id, r)))
    }

    /// Every observation, users in first-seen order and items in first-seen
    /// order within each user
    pub fn entries(&self) -> impl Iterator<Item = RatingEntry> + '_ {
        self.iter().flat_map(|(user_id, ratings)| {
            ratings
                .iter()
                .map(move |(item_id, value)| RatingEntry::new(user_id.clone(), item_id.clone(), value))
        })
    }

    /// Largest rating value observed anywhere, 0.0 for an empty store
    pub fn max_rating(&self) -> f32 {
        self.ratings
            .values()
            .flat_map(|r| r.iter().map(|(_, v)| v))
            .fold(0.0, f32::max)
    }

    pub fn user_count(&self) -> usize {
        self.order.len()
    }

    /// Get counts for debugging/validation: (users, ratings)
    pub fn counts(&self) -> (usize, usize) {
        let total = self.ratings.values().map(|r| r.len()).sum();
        (self.order.len(), total)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_keeps_first_seen_order() {
        let mut store = RatingStore::new();
        store.insert(RatingEntry::new("7", "b", 4.0));
        store.insert(RatingEntry::new("3", "a", 2.0));
        store.insert(RatingEntry::new("7", "a", 5.0));

        assert_eq!(store.user_ids(), &["7".to_string(), "3".to_string()]);
        let items: Vec<&ItemId> = store.get_user_ratings("7").unwrap().iter().map(|(id, _)| id).collect();
        assert_eq!(items, vec!["b", "a"]);
    }

    #[test]
    fn test_repeated_rating_overwrites_in_place() {
        let mut store = RatingStore::new();
        store.insert(RatingEntry::new("1", "x", 1.0));
        store.insert(RatingEntry::new("1", "y", 2.0));
        store.insert(RatingEntry::new("1", "x", 4.5));

        let ratings = store.get_user_ratings("1").unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings.get("x"), Some(4.5));
        assert_eq!(ratings.iter().next().map(|(id, _)| id.as_str()), Some("x"));
    }

    #[test]
    fn test_max_rating_and_counts() {
        let mut store = RatingStore::new();
        assert_eq!(store.max_rating(), 0.0);

        store.insert(RatingEntry::new("1", "x", 3.5));
        store.insert(RatingEntry::new("2", "x", 5.0));
        store.insert(RatingEntry::new("2", "y", 1.0));

        assert_eq!(store.max_rating(), 5.0);
        assert_eq!(store.counts(), (2, 3));
    }

    #[test]
    fn test_catalog_reinsert_keeps_position() {
        let mut catalog = ItemCatalog::new();
        catalog.insert(Item::new("1", "Toy Story (1995)", "Animation|Children's|Comedy"));
        catalog.insert(Item::new("2", "Jumanji (1995)", "Adventure"));
        catalog.insert(Item::new("1", "Toy Story", "Animation"));

        assert_eq!(catalog.ids(), &["1".to_string(), "2".to_string()]);
        assert_eq!(catalog.get("1").unwrap().title, "Toy Story");
    }

    #[test]
    fn test_normalized_tags() {
        let item = Item::new("1", "Heat (1995)", "Action|Crime|Thriller");
        assert_eq!(item.normalized_tags(), "Action Crime Thriller");
    }
}
