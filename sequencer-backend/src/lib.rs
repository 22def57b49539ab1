//! Wallet transaction sequencer
//!
//! A single-slot, FIFO queue for wallet actions (transfers, approvals, swaps,
//! liquidity moves, contract calls) plus the chain-facing action functions
//! that feed it.

pub mod actions;
pub mod config;
pub mod events;
pub mod tx_queue;
pub mod wallet;
