//! # Repository Module
//!
//! One repository per ledger, plus the purchase commit that spans all three.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database (store handle)                                                │
//! │       │                                                                 │
//! │       ├── items()       ItemRepository          stock_67011755          │
//! │       │                 ├── list_all / list_available / get_by_name     │
//! │       │                 ├── insert / delete                             │
//! │       │                 └── adjust_stock / restock                      │
//! │       │                                                                 │
//! │       ├── change()      ChangeReserveRepository change_box_67011755     │
//! │       │                 └── counts / adjust / refill / refill_all       │
//! │       │                                                                 │
//! │       ├── collection()  CollectionBoxRepository collection_box_67011755 │
//! │       │                 └── counts / increment / collect                │
//! │       │                                                                 │
//! │       └── purchases()   PurchaseRepository      all three, one tx       │
//! │                         └── commit                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`](item::ItemRepository) - Inventory ledger
//! - [`ChangeReserveRepository`](cash::ChangeReserveRepository) - Change reserve
//! - [`CollectionBoxRepository`](cash::CollectionBoxRepository) - Collection box
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Atomic purchase commit

pub mod cash;
pub mod item;
pub mod purchase;
