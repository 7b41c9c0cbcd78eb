/// Sample TPC-H style dataset: a `lineitem` and an `orders` table.
///
/// Values are deterministic so that queries over a freshly loaded store
/// always return the same rows.
use super::key::PRIMARY_KEY_MASK;
use super::MemoryStore;
use crate::core::{Catalog, DataType, Result, Row, TableSchema, Value};

pub const LINEITEM: &str = "lineitem";
pub const ORDERS: &str = "orders";
pub const LINEITEM_TAG: u8 = 0;
pub const ORDERS_TAG: u8 = 1;

const LINEITEM_COLUMNS: &[(&str, DataType)] = &[
    ("ORDERKEY", DataType::Int),
    ("PARTKEY", DataType::Int),
    ("SUPPKEY", DataType::Int),
    ("LINENUMBER", DataType::Int),
    ("QUANTITY", DataType::Int),
    ("EXTENDEDPRICE", DataType::Int),
    ("DISCOUNT", DataType::Int),
    ("TAX", DataType::Int),
    ("RETURNFLAG", DataType::String),
    ("LINESTATUS", DataType::String),
    ("SHIPDATE", DataType::String),
    ("COMMITDATE", DataType::String),
    ("RECEIPTDATE", DataType::String),
    ("SHIPINSTRUCT", DataType::String),
    ("SHIPMODE", DataType::String),
    ("COMMENT", DataType::String),
];

const ORDERS_COLUMNS: &[(&str, DataType)] = &[
    ("ORDERKEY", DataType::Int),
    ("ORDERDATE", DataType::String),
    ("SHIPPRIORITY", DataType::String),
];

/// Ship date, return flag, line status and ship mode, cycled by line number.
const SHIP_CLASSES: [(&str, &str, &str, &str); 3] = [
    ("1998-09-03", "A", "1", "AIR"),
    ("1998-09-04", "B", "2", "MAIL"),
    ("1998-11-05", "C", "3", "SHIP"),
];

/// Catalog holding the `lineitem` and `orders` schemas. Each table owns the
/// whole primary-key slice of its tag.
pub fn sample_catalog() -> Result<Catalog> {
    let mut catalog = Catalog::new();
    catalog.create_table(TableSchema::new(
        LINEITEM,
        LINEITEM_TAG,
        0..PRIMARY_KEY_MASK,
        LINEITEM_COLUMNS,
    )?)?;
    catalog.create_table(TableSchema::new(
        ORDERS,
        ORDERS_TAG,
        0..PRIMARY_KEY_MASK,
        ORDERS_COLUMNS,
    )?)?;
    Ok(catalog)
}

/// Line item `uid`. ORDERKEY wraps at `orders + 2`, so the last two order
/// keys of every cycle have no matching order.
pub fn lineitem_row(uid: u64, orders: u64) -> Row {
    let i = uid as i64;
    let (ship_date, flag, status, mode) = SHIP_CLASSES[(uid % 3) as usize];
    let quantity = i * 10;
    Row::new(vec![
        Value::from(LINEITEM),
        Value::Int((uid % (orders + 2)) as i64),
        Value::Int(i % 7),
        Value::Int(i % 5),
        Value::Int(i),
        Value::Int(quantity),
        Value::Int(quantity * 100),
        Value::Int(100 + (i * 37 + 13) % 900),
        Value::Int(100 + (i * 53 + 29) % 900),
        Value::from(flag),
        Value::from(status),
        Value::from(ship_date),
        Value::from(ship_date),
        Value::from(ship_date),
        Value::from("NONE"),
        Value::from(mode),
        Value::from(""),
    ])
}

pub fn order_row(uid: u64) -> Row {
    Row::new(vec![
        Value::from(ORDERS),
        Value::Int(uid as i64),
        Value::from("1998-08-01"),
        Value::from(if uid % 2 == 0 { "Y" } else { "N" }),
    ])
}

/// Build the sample catalog and a store holding `lineitems` line items and
/// `orders` orders.
pub fn load_sample(lineitems: u64, orders: u64) -> Result<(Catalog, MemoryStore)> {
    let catalog = sample_catalog()?;
    let mut store = MemoryStore::new();
    for uid in 0..lineitems {
        store.put(LINEITEM_TAG, uid, &lineitem_row(uid, orders))?;
    }
    for uid in 0..orders {
        store.put(ORDERS_TAG, uid, &order_row(uid))?;
    }
    log::debug!(
        "loaded sample dataset: {lineitems} lineitems, {orders} orders ({} rows)",
        store.len()
    );
    Ok((catalog, store))
}
