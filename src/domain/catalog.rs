use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Restaurant fields captured when the first item enters a cart. The cart
/// keeps this copy; later catalog edits never reach an open cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RestaurantSnapshot {
    pub id: Uuid,
    pub name: String,
    pub is_open: bool,
    pub delivery_fee: i64,
    pub min_order: i64,
}

/// Menu item fields captured at add-to-cart time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MenuItemSnapshot {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub price: i64,
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AddOnOption {
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AddOnGroupSnapshot {
    pub name: String,
    pub is_required: bool,
    pub max_selections: i32,
    pub options: Vec<AddOnOption>,
}

/// One chosen add-on, denormalized the way it is stored on order items.
/// The price is the catalog price, never the client-submitted one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct SelectedAddOn {
    pub group_name: String,
    pub option_name: String,
    pub price: i64,
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("add-on group \"{group}\" does not exist for this item")]
    UnknownGroup { group: String },

    #[error("option \"{option}\" does not exist in add-on group \"{group}\"")]
    UnknownOption { group: String, option: String },

    #[error("add-on group \"{group}\" requires at least one selection")]
    RequiredGroupEmpty { group: String },

    #[error("add-on group \"{group}\" allows at most {max} selections")]
    TooManySelections { group: String, max: i32 },
}

/// Validate a customer's add-on choices against the item's groups and return
/// the canonical selections with catalog prices substituted in.
///
/// Rules: a required group must have at least one selection, no group may
/// exceed its `max_selections`, and every selection must name a real
/// group/option pair. Selections are a set: repeating the same group/option
/// pair collapses to one entry and is charged once.
pub fn validate_selections(
    groups: &[AddOnGroupSnapshot],
    selected: &[SelectedAddOn],
) -> Result<Vec<SelectedAddOn>, SelectionError> {
    let mut canonical: Vec<SelectedAddOn> = Vec::with_capacity(selected.len());

    for sel in selected {
        let group = groups
            .iter()
            .find(|g| g.name == sel.group_name)
            .ok_or_else(|| SelectionError::UnknownGroup {
                group: sel.group_name.clone(),
            })?;
        let option = group
            .options
            .iter()
            .find(|o| o.name == sel.option_name)
            .ok_or_else(|| SelectionError::UnknownOption {
                group: group.name.clone(),
                option: sel.option_name.clone(),
            })?;
        let duplicate = canonical
            .iter()
            .any(|c| c.group_name == group.name && c.option_name == option.name);
        if duplicate {
            continue;
        }
        canonical.push(SelectedAddOn {
            group_name: group.name.clone(),
            option_name: option.name.clone(),
            price: option.price,
        });
    }

    for group in groups {
        let count = canonical
            .iter()
            .filter(|s| s.group_name == group.name)
            .count() as i32;
        if group.is_required && count == 0 {
            return Err(SelectionError::RequiredGroupEmpty {
                group: group.name.clone(),
            });
        }
        if count > group.max_selections {
            return Err(SelectionError::TooManySelections {
                group: group.name.clone(),
                max: group.max_selections,
            });
        }
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sauces(required: bool, max: i32) -> AddOnGroupSnapshot {
        AddOnGroupSnapshot {
            name: "Sauces".into(),
            is_required: required,
            max_selections: max,
            options: vec![
                AddOnOption { name: "Garlic".into(), price: 500 },
                AddOnOption { name: "Spicy".into(), price: 700 },
            ],
        }
    }

    fn pick(group: &str, option: &str, price: i64) -> SelectedAddOn {
        SelectedAddOn {
            group_name: group.into(),
            option_name: option.into(),
            price,
        }
    }

    #[test]
    fn required_group_must_have_a_selection() {
        let groups = vec![sauces(true, 2)];
        let err = validate_selections(&groups, &[]).unwrap_err();
        assert_eq!(
            err,
            SelectionError::RequiredGroupEmpty { group: "Sauces".into() }
        );
    }

    #[test]
    fn max_selections_is_enforced() {
        let groups = vec![sauces(false, 1)];
        let picks = [pick("Sauces", "Garlic", 500), pick("Sauces", "Spicy", 700)];
        let err = validate_selections(&groups, &picks).unwrap_err();
        assert_eq!(
            err,
            SelectionError::TooManySelections { group: "Sauces".into(), max: 1 }
        );
    }

    #[test]
    fn catalog_price_overrides_client_price() {
        let groups = vec![sauces(false, 2)];
        // Client claims the garlic sauce is free.
        let picks = [pick("Sauces", "Garlic", 0)];
        let canonical = validate_selections(&groups, &picks).unwrap();
        assert_eq!(canonical[0].price, 500);
    }

    #[test]
    fn repeated_option_collapses_and_charges_once() {
        let groups = vec![sauces(false, 2)];
        let picks = [pick("Sauces", "Garlic", 500), pick("Sauces", "Garlic", 500)];
        let canonical = validate_selections(&groups, &picks).unwrap();
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical[0].price, 500);
    }

    #[test]
    fn unknown_group_and_option_are_rejected() {
        let groups = vec![sauces(false, 2)];
        assert!(matches!(
            validate_selections(&groups, &[pick("Drinks", "Cola", 0)]),
            Err(SelectionError::UnknownGroup { .. })
        ));
        assert!(matches!(
            validate_selections(&groups, &[pick("Sauces", "Ketchup", 0)]),
            Err(SelectionError::UnknownOption { .. })
        ));
    }
}
