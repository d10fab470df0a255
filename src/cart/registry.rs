//! Active cart registry
//!
//! Process-local carts keyed by user id. Every operation takes the lock
//! once and does its whole read-modify-write inside it, so two requests
//! for the same user can never interleave a scan with a mutation.

use crate::models::{Cart, Dish};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq)]
pub enum RemoveError {
    NoActiveCart,
    NotInCart,
}

#[derive(Default)]
pub struct CartRegistry {
    carts: Mutex<HashMap<Uuid, Cart>>,
}

impl CartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the user's active cart
    pub fn get(&self, user_id: Uuid) -> Option<Cart> {
        self.carts.lock().get(&user_id).cloned()
    }

    /// Append `dish`, creating the cart on first use.
    pub fn add_dish(&self, user_id: Uuid, dish: Dish) -> Cart {
        let mut carts = self.carts.lock();
        let cart = carts.entry(user_id).or_insert_with(|| {
            debug!("Opening cart for user {}", user_id);
            Cart::new(user_id)
        });
        cart.add(dish);
        cart.clone()
    }

    /// Remove the first line for `dish_id`.
    pub fn remove_dish(&self, user_id: Uuid, dish_id: Uuid) -> Result<Cart, RemoveError> {
        let mut carts = self.carts.lock();
        let cart = carts.get_mut(&user_id).ok_or(RemoveError::NoActiveCart)?;
        if !cart.remove_first(dish_id) {
            return Err(RemoveError::NotInCart);
        }
        Ok(cart.clone())
    }

    /// Drop the cart without persisting it. Returns false if there was none.
    pub fn clear(&self, user_id: Uuid) -> bool {
        self.carts.lock().remove(&user_id).is_some()
    }

    /// Take the cart out of the registry for finalization.
    pub fn take(&self, user_id: Uuid) -> Option<Cart> {
        self.carts.lock().remove(&user_id)
    }

    /// Put back a cart whose finalization failed.
    ///
    /// If the user opened a new cart in the meantime, the returned lines
    /// go in front of the new ones.
    pub fn restore(&self, cart: Cart) {
        let mut carts = self.carts.lock();
        match carts.get_mut(&cart.user_id) {
            Some(newer) => newer.prepend(cart.dishes),
            None => {
                carts.insert(cart.user_id, cart);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn dish(name: &str, price: f64) -> Dish {
        Dish {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            allergens: String::new(),
            price,
        }
    }

    #[test]
    fn test_lazy_creation_and_lifecycle() {
        let registry = CartRegistry::new();
        let user = Uuid::new_v4();
        assert!(registry.get(user).is_none());

        let a = dish("A", 5.0);
        let cart = registry.add_dish(user, a.clone());
        assert_eq!(cart.price, 5.0);
        assert_eq!(registry.get(user), Some(cart));

        assert_eq!(
            registry.remove_dish(user, Uuid::new_v4()),
            Err(RemoveError::NotInCart)
        );
        let emptied = registry.remove_dish(user, a.id).unwrap();
        assert!(emptied.dishes.is_empty());
        assert_eq!(emptied.price, 0.0);
        // Emptied carts stay active
        assert!(registry.get(user).is_some());

        assert!(registry.clear(user));
        assert!(!registry.clear(user));
        assert_eq!(
            registry.remove_dish(user, a.id),
            Err(RemoveError::NoActiveCart)
        );
    }

    #[test]
    fn test_carts_are_per_user() {
        let registry = CartRegistry::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        registry.add_dish(alice, dish("A", 1.0));
        registry.add_dish(bob, dish("B", 2.0));
        registry.add_dish(bob, dish("C", 3.0));

        assert_eq!(registry.get(alice).unwrap().dishes.len(), 1);
        assert_eq!(registry.get(bob).unwrap().price, 5.0);

        let taken = registry.take(alice).unwrap();
        assert_eq!(taken.user_id, alice);
        assert!(registry.get(alice).is_none());
        assert!(registry.get(bob).is_some());
    }

    #[test]
    fn test_restore_after_failed_finalize() {
        let registry = CartRegistry::new();
        let user = Uuid::new_v4();
        let a = dish("A", 1.0);
        let b = dish("B", 2.0);

        registry.add_dish(user, a.clone());
        let taken = registry.take(user).unwrap();

        registry.add_dish(user, b.clone());
        registry.restore(taken);

        let cart = registry.get(user).unwrap();
        assert_eq!(cart.dishes, vec![a, b]);
        assert_eq!(cart.price, 3.0);
    }

    #[test]
    fn test_concurrent_adds_keep_every_dish() {
        let registry = Arc::new(CartRegistry::new());
        let user = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        registry.add_dish(user, dish(&format!("D{i}"), 1.0));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let cart = registry.get(user).unwrap();
        assert_eq!(cart.dishes.len(), 200);
        assert_eq!(cart.price, 200.0);
    }
}
