// src/book.rs
//! Per-symbol limit order book.
//!
//! The book tracks aggregate quantity per price level on each side plus a
//! per-order record for routing modifies, executes, and deletes. It is a
//! market-data book, not a matching engine: an order that would cross the
//! opposite best is rejected outright, with equality counted as crossing.
//!
//! ## Performance Characteristics
//!
//! - Add/Modify/Delete: O(log L) over L distinct price levels
//! - Execute: O(1) amortized (touches an existing level)
//! - Top of book: reads the first entry on each side
//! - Level aggregates are maintained incrementally, never recomputed
//!
//! ## Example
//!
//! ```rust
//! use feedbook::book::OrderBook;
//! use feedbook::wire::Side;
//!
//! let mut book = OrderBook::new();
//! assert!(book.on_add(1, Side::Buy, 100_000_000_000, 100));
//! assert!(book.on_execute(1, 30));
//!
//! let tob = book.top_of_book();
//! assert_eq!(tob.best_bid_px, 100_000_000_000);
//! assert_eq!(tob.bid_sz, 70);
//! ```

use std::collections::BTreeMap;

use hashbrown::HashMap;

use crate::wire::Side;

pub type OrderId = u64;

#[derive(Clone, Copy, Debug)]
struct OrderRecord {
    side: Side,
    price: i64,
    qty: u32,
}

/// Best bid and ask with their aggregate sizes. A zero size means that
/// side is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TopOfBook {
    pub best_bid_px: i64,
    pub bid_sz: u64,
    pub best_ask_px: i64,
    pub ask_sz: u64,
}

impl TopOfBook {
    #[inline]
    pub fn has_bid(&self) -> bool {
        self.bid_sz > 0
    }

    #[inline]
    pub fn has_ask(&self) -> bool {
        self.ask_sz > 0
    }
}

#[derive(Default)]
pub struct OrderBook {
    // Both sides keyed ascending; best bid is the last entry, best ask the
    // first.
    bids: BTreeMap<i64, u64>,
    asks: BTreeMap<i64, u64>,
    orders: HashMap<OrderId, OrderRecord>,
}

impl OrderBook {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn reserve_orders(&mut self, n: usize) {
        self.orders.reserve(n);
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Insert a new order. Rejects a duplicate id, a zero quantity, or a
    /// price that would cross the opposite best.
    pub fn on_add(&mut self, order_id: OrderId, side: Side, price: i64, qty: u32) -> bool {
        if qty == 0 || self.orders.contains_key(&order_id) || self.crosses(side, price) {
            return false;
        }
        self.orders.insert(order_id, OrderRecord { side, price, qty });
        self.add_to_level(side, price, qty);
        true
    }

    /// Re-price and re-size an existing order. The crossing test runs
    /// against the current book state, with the order being modified still
    /// resident at its old level.
    pub fn on_modify(&mut self, order_id: OrderId, new_price: i64, new_qty: u32) -> bool {
        let Some(&rec) = self.orders.get(&order_id) else {
            return false;
        };
        if new_qty == 0 || self.crosses(rec.side, new_price) {
            return false;
        }
        self.remove_from_level(rec.side, rec.price, rec.qty);
        self.add_to_level(rec.side, new_price, new_qty);
        self.orders.insert(
            order_id,
            OrderRecord {
                side: rec.side,
                price: new_price,
                qty: new_qty,
            },
        );
        true
    }

    /// Partially or fully fill an order. Rejects an execution larger than
    /// the order's remaining quantity; a fill to zero removes the order.
    pub fn on_execute(&mut self, order_id: OrderId, exec_qty: u32) -> bool {
        if exec_qty == 0 {
            return false;
        }
        let Some(rec) = self.orders.get_mut(&order_id) else {
            return false;
        };
        if exec_qty > rec.qty {
            return false;
        }
        rec.qty -= exec_qty;
        let (side, price, emptied) = (rec.side, rec.price, rec.qty == 0);
        if emptied {
            self.orders.remove(&order_id);
        }
        self.remove_from_level(side, price, exec_qty);
        true
    }

    pub fn on_delete(&mut self, order_id: OrderId) -> bool {
        let Some(rec) = self.orders.remove(&order_id) else {
            return false;
        };
        self.remove_from_level(rec.side, rec.price, rec.qty);
        true
    }

    pub fn top_of_book(&self) -> TopOfBook {
        let mut tob = TopOfBook::default();
        if let Some((&px, &sz)) = self.bids.last_key_value() {
            tob.best_bid_px = px;
            tob.bid_sz = sz;
        }
        if let Some((&px, &sz)) = self.asks.first_key_value() {
            tob.best_ask_px = px;
            tob.ask_sz = sz;
        }
        tob
    }

    /// A BUY crosses iff priced at or through the best ask; a SELL iff at
    /// or through the best bid.
    fn crosses(&self, side: Side, price: i64) -> bool {
        match side {
            Side::Buy => self
                .asks
                .first_key_value()
                .is_some_and(|(&ask, _)| price >= ask),
            Side::Sell => self
                .bids
                .last_key_value()
                .is_some_and(|(&bid, _)| price <= bid),
        }
    }

    fn add_to_level(&mut self, side: Side, price: i64, qty: u32) {
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        *levels.entry(price).or_insert(0) += u64::from(qty);
    }

    fn remove_from_level(&mut self, side: Side, price: i64, qty: u32) {
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(agg) = levels.get_mut(&price) {
            *agg = agg.saturating_sub(u64::from(qty));
            if *agg == 0 {
                levels.remove(&price);
            }
        }
    }
}

impl OrderBook {
    /// Check the book's structural invariants. Test helper; panics on the
    /// first violation.
    pub fn assert_invariants(&self) {
        // 1) no zero-qty levels
        assert!(self.bids.values().all(|&q| q > 0), "zero bid level");
        assert!(self.asks.values().all(|&q| q > 0), "zero ask level");

        // 2) no zero-qty orders
        assert!(self.orders.values().all(|r| r.qty > 0), "zero qty order");

        // 3) level aggregates must equal the sum of resident orders
        let mut agg_bids: HashMap<i64, u64> = HashMap::new();
        let mut agg_asks: HashMap<i64, u64> = HashMap::new();
        for r in self.orders.values() {
            let map = match r.side {
                Side::Buy => &mut agg_bids,
                Side::Sell => &mut agg_asks,
            };
            *map.entry(r.price).or_insert(0) += u64::from(r.qty);
        }
        assert_eq!(self.bids.len(), agg_bids.len(), "stray bid level");
        assert_eq!(self.asks.len(), agg_asks.len(), "stray ask level");
        for (&px, &q) in self.bids.iter() {
            let exp = agg_bids.get(&px).copied().unwrap_or(0);
            assert_eq!(q, exp, "bid level qty mismatch at px={px}");
        }
        for (&px, &q) in self.asks.iter() {
            let exp = agg_asks.get(&px).copied().unwrap_or(0);
            assert_eq!(q, exp, "ask level qty mismatch at px={px}");
        }

        // 4) best_bid < best_ask whenever both sides are populated
        if let (Some((&bid, _)), Some((&ask, _))) =
            (self.bids.last_key_value(), self.asks.first_key_value())
        {
            assert!(bid < ask, "crossed book: bid={bid} ask={ask}");
        }
    }
}
