//! Schema of the indexed perpetual-exchange entities.
//!
//! Markets own positions, orders and trades; positions own the orders and
//! trades that changed them. Amounts denominated in token or USD units with 30
//! decimals are `BigInt`, ratios that need exact decimal arithmetic are
//! `BigDecimal`.

use crate::types::schema::{EntitySchema, EnumDef, FieldType, Schema};
use crate::types::value::ScalarKind;

pub const MARKET: &str = "Market";
pub const POSITION: &str = "Position";
pub const ORDER: &str = "Order";
pub const TRADE: &str = "Trade";

pub fn position_status() -> EnumDef {
    EnumDef::new("PositionStatus", ["OPEN", "CLOSED", "LIQUIDATED"])
}

pub fn order_type() -> EnumDef {
    EnumDef::new(
        "OrderType",
        [
            "MARKET_INCREASE",
            "MARKET_DECREASE",
            "LIMIT_INCREASE",
            "LIMIT_DECREASE",
            "STOP_LOSS_DECREASE",
            "LIQUIDATION",
        ],
    )
}

pub fn order_status() -> EnumDef {
    EnumDef::new("OrderStatus", ["CREATED", "EXECUTED", "CANCELLED", "FROZEN"])
}

pub fn trade_event() -> EnumDef {
    EnumDef::new("TradeEvent", ["INCREASE", "DECREASE", "LIQUIDATION"])
}

fn market() -> EntitySchema {
    EntitySchema::new(MARKET)
        .unique("marketToken", FieldType::STRING)
        .field("indexToken", FieldType::STRING)
        .field("longToken", FieldType::STRING)
        .field("shortToken", FieldType::STRING)
        .field("symbol", FieldType::STRING)
        .field("openInterestLong", FieldType::BIG_INT)
        .field("openInterestShort", FieldType::BIG_INT)
        .nullable("utilization", FieldType::FLOAT)
        .field("isDisabled", FieldType::BOOLEAN)
        .field("listedAt", FieldType::INT)
        .relation("positions", POSITION, "market")
        .relation("orders", ORDER, "market")
        .relation("trades", TRADE, "market")
}

fn position() -> EntitySchema {
    EntitySchema::new(POSITION)
        .field("account", FieldType::STRING)
        .field("market", FieldType::STRING)
        .field("collateralToken", FieldType::STRING)
        .field("isLong", FieldType::BOOLEAN)
        .field("status", FieldType::Enum(position_status()))
        .nullable("sizeInUsd", FieldType::BIG_INT)
        .nullable("sizeInTokens", FieldType::BIG_INT)
        .field("collateralAmount", FieldType::BIG_INT)
        .nullable("entryPrice", FieldType::BIG_INT)
        .nullable("leverage", FieldType::BIG_DECIMAL)
        .nullable("realizedPnlUsd", FieldType::BIG_INT)
        .field("labels", FieldType::List(ScalarKind::String))
        .field("openedAt", FieldType::INT)
        .nullable("closedAt", FieldType::INT)
        .relation("orders", ORDER, "position")
        .relation("trades", TRADE, "position")
}

fn order() -> EntitySchema {
    EntitySchema::new(ORDER)
        .field("account", FieldType::STRING)
        .field("market", FieldType::STRING)
        .nullable("position", FieldType::STRING)
        .field("orderType", FieldType::Enum(order_type()))
        .field("status", FieldType::Enum(order_status()))
        .field("isLong", FieldType::BOOLEAN)
        .field("sizeDeltaUsd", FieldType::BIG_INT)
        .nullable("triggerPrice", FieldType::BIG_INT)
        .field("acceptablePrice", FieldType::BIG_INT)
        .nullable("uiFeeReceiver", FieldType::STRING)
        .field("createdAt", FieldType::INT)
        .nullable("executedAt", FieldType::INT)
}

fn trade() -> EntitySchema {
    EntitySchema::new(TRADE)
        .field("account", FieldType::STRING)
        .field("market", FieldType::STRING)
        .field("position", FieldType::STRING)
        .field("event", FieldType::Enum(trade_event()))
        .field("isLong", FieldType::BOOLEAN)
        .field("sizeDeltaUsd", FieldType::BIG_INT)
        .field("executionPrice", FieldType::BIG_INT)
        .nullable("pnlUsd", FieldType::BIG_INT)
        .nullable("feeUsd", FieldType::BIG_DECIMAL)
        .field("transactionHash", FieldType::STRING)
        .field("timestamp", FieldType::INT)
}

/// Market, Position, Order and Trade with their relations.
pub fn schema() -> Schema {
    Schema::new()
        .with_entity(market())
        .with_entity(position())
        .with_entity(order())
        .with_entity(trade())
}
