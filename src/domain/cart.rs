use crate::domain::catalog::{MenuItemSnapshot, RestaurantSnapshot, SelectedAddOn};

/// One distinct (item, add-on selection) entry in a cart.
///
/// The add-ons are kept sorted so two selections that differ only in
/// insertion order produce the same [`CartLine::key`] and collapse into a
/// single line.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item: MenuItemSnapshot,
    pub add_ons: Vec<SelectedAddOn>,
    pub quantity: i32,
}

impl CartLine {
    /// Canonical identity of this line: item id plus the sorted
    /// `group:option` pairs.
    pub fn key(&self) -> String {
        line_key(self.item.id, &self.add_ons)
    }

    /// Base price plus every chosen option, for one unit.
    pub fn unit_price(&self) -> i64 {
        self.item.price + self.add_ons.iter().map(|a| a.price).sum::<i64>()
    }

    pub fn line_total(&self) -> i64 {
        self.unit_price() * self.quantity as i64
    }
}

fn line_key(item_id: uuid::Uuid, add_ons: &[SelectedAddOn]) -> String {
    let mut key = item_id.to_string();
    for addon in add_ons {
        key.push('|');
        key.push_str(&addon.group_name);
        key.push(':');
        key.push_str(&addon.option_name);
    }
    key
}

/// A customer's in-progress selection from exactly one restaurant.
///
/// Owned by whoever is running the checkout flow; there is no shared global
/// cart. Operations never fail: invalid quantities are clamped and adding
/// from a different restaurant replaces the cart wholesale.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    restaurant: Option<RestaurantSnapshot>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn restaurant(&self) -> Option<&RestaurantSnapshot> {
        self.restaurant.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of `item`. See [`Cart::add_item_with_quantity`].
    pub fn add_item(
        &mut self,
        item: MenuItemSnapshot,
        restaurant: RestaurantSnapshot,
        add_ons: Vec<SelectedAddOn>,
    ) -> String {
        self.add_item_with_quantity(item, restaurant, add_ons, 1)
    }

    /// Add `quantity` units of `item` with the given add-ons, returning the
    /// line key.
    ///
    /// If the cart already holds lines from a different restaurant the whole
    /// cart is replaced with this single line. If a line with the same
    /// identity key exists its quantity is incremented; otherwise a new line
    /// is appended. Quantities below 1 are clamped to 1.
    pub fn add_item_with_quantity(
        &mut self,
        item: MenuItemSnapshot,
        restaurant: RestaurantSnapshot,
        mut add_ons: Vec<SelectedAddOn>,
        quantity: i32,
    ) -> String {
        let quantity = quantity.max(1);
        add_ons.sort();

        if let Some(current) = &self.restaurant {
            if current.id != restaurant.id {
                self.lines.clear();
            }
        }
        self.restaurant = Some(restaurant);

        let key = line_key(item.id, &add_ons);
        match self.lines.iter_mut().find(|l| l.key() == key) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine { item, add_ons, quantity }),
        }
        key
    }

    /// Delete the line with `key`. Removing the last line also clears the
    /// restaurant binding: an empty cart has no owning restaurant.
    pub fn remove_line(&mut self, key: &str) {
        self.lines.retain(|l| l.key() != key);
        if self.lines.is_empty() {
            self.restaurant = None;
        }
    }

    /// Overwrite a line's quantity. Zero or negative removes the line.
    pub fn set_quantity(&mut self, key: &str, quantity: i32) {
        if quantity <= 0 {
            self.remove_line(key);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.key() == key) {
            line.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.restaurant = None;
    }

    pub fn subtotal(&self) -> i64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Subtotal plus the bound restaurant's delivery fee; an empty cart has
    /// no restaurant and therefore no fee.
    pub fn total(&self) -> i64 {
        let fee = self.restaurant.as_ref().map_or(0, |r| r.delivery_fee);
        self.subtotal() + fee
    }

    /// Sum of quantities across lines (for badge display), not the line count.
    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn restaurant(id: Uuid, delivery_fee: i64) -> RestaurantSnapshot {
        RestaurantSnapshot {
            id,
            name: "Test Kitchen".into(),
            is_open: true,
            delivery_fee,
            min_order: 0,
        }
    }

    fn item(id: Uuid, restaurant_id: Uuid, price: i64) -> MenuItemSnapshot {
        MenuItemSnapshot {
            id,
            restaurant_id,
            name: "Shawarma".into(),
            price,
            is_available: true,
        }
    }

    fn addon(group: &str, option: &str, price: i64) -> SelectedAddOn {
        SelectedAddOn {
            group_name: group.into(),
            option_name: option.into(),
            price,
        }
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let cart = Cart::new();
        assert_eq!(cart.subtotal(), 0);
        assert_eq!(cart.total(), 0);
        assert_eq!(cart.item_count(), 0);
        assert!(cart.restaurant().is_none());
    }

    #[test]
    fn adding_same_item_increments_quantity() {
        let rid = Uuid::new_v4();
        let iid = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(item(iid, rid, 3000), restaurant(rid, 1000), vec![]);
        cart.add_item(item(iid, rid, 3000), restaurant(rid, 1000), vec![]);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn addon_order_does_not_split_lines() {
        let rid = Uuid::new_v4();
        let iid = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(
            item(iid, rid, 3000),
            restaurant(rid, 1000),
            vec![addon("Sauces", "Garlic", 500), addon("Sauces", "Spicy", 700)],
        );
        cart.add_item(
            item(iid, rid, 3000),
            restaurant(rid, 1000),
            vec![addon("Sauces", "Spicy", 700), addon("Sauces", "Garlic", 500)],
        );

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn different_addons_make_distinct_lines() {
        let rid = Uuid::new_v4();
        let iid = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(item(iid, rid, 3000), restaurant(rid, 1000), vec![]);
        cart.add_item(
            item(iid, rid, 3000),
            restaurant(rid, 1000),
            vec![addon("Sauces", "Garlic", 500)],
        );

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn cross_restaurant_add_replaces_cart() {
        let rid_a = Uuid::new_v4();
        let rid_b = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(item(Uuid::new_v4(), rid_a, 3000), restaurant(rid_a, 1000), vec![]);
        cart.add_item(item(Uuid::new_v4(), rid_a, 2000), restaurant(rid_a, 1000), vec![]);
        assert_eq!(cart.lines().len(), 2);

        let b_item = item(Uuid::new_v4(), rid_b, 9000);
        cart.add_item(b_item.clone(), restaurant(rid_b, 2000), vec![]);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].item.id, b_item.id);
        assert_eq!(cart.lines()[0].quantity, 1);
        assert_eq!(cart.restaurant().unwrap().id, rid_b);
    }

    #[test]
    fn set_quantity_zero_or_negative_removes_line() {
        let rid = Uuid::new_v4();
        let mut cart = Cart::new();
        let key_a = cart.add_item(item(Uuid::new_v4(), rid, 3000), restaurant(rid, 1000), vec![]);
        let key_b = cart.add_item(item(Uuid::new_v4(), rid, 2000), restaurant(rid, 1000), vec![]);

        cart.set_quantity(&key_a, 0);
        assert_eq!(cart.lines().len(), 1);

        cart.set_quantity(&key_b, -5);
        assert!(cart.is_empty());
        // Empty cart drops the restaurant binding too.
        assert!(cart.restaurant().is_none());
        assert_eq!(cart.total(), 0);
    }

    #[test]
    fn set_quantity_overwrites() {
        let rid = Uuid::new_v4();
        let mut cart = Cart::new();
        let key = cart.add_item(item(Uuid::new_v4(), rid, 3000), restaurant(rid, 1000), vec![]);
        cart.set_quantity(&key, 7);
        assert_eq!(cart.lines()[0].quantity, 7);
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn remove_last_line_clears_restaurant() {
        let rid = Uuid::new_v4();
        let mut cart = Cart::new();
        let key = cart.add_item(item(Uuid::new_v4(), rid, 3000), restaurant(rid, 1000), vec![]);
        cart.remove_line(&key);
        assert!(cart.is_empty());
        assert!(cart.restaurant().is_none());
    }

    #[test]
    fn pricing_formula_with_addons_and_fee() {
        // One line: price 8000, qty 2, one add-on priced 500; fee 5000.
        let rid = Uuid::new_v4();
        let mut cart = Cart::new();
        let key = cart.add_item(
            item(Uuid::new_v4(), rid, 8000),
            restaurant(rid, 5000),
            vec![addon("Extras", "Cheese", 500)],
        );
        cart.set_quantity(&key, 2);

        assert_eq!(cart.subtotal(), 17_000);
        assert_eq!(cart.total(), 22_000);
    }

    #[test]
    fn clear_empties_everything() {
        let rid = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(item(Uuid::new_v4(), rid, 3000), restaurant(rid, 1000), vec![]);
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.restaurant().is_none());
        assert_eq!(cart.total(), 0);
    }

    #[test]
    fn add_with_quantity_merges() {
        let rid = Uuid::new_v4();
        let iid = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item_with_quantity(item(iid, rid, 3000), restaurant(rid, 1000), vec![], 3);
        cart.add_item_with_quantity(item(iid, rid, 3000), restaurant(rid, 1000), vec![], 2);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);

        // Quantities below one are clamped, never rejected.
        cart.add_item_with_quantity(item(iid, rid, 3000), restaurant(rid, 1000), vec![], -4);
        assert_eq!(cart.lines()[0].quantity, 6);
    }
}
