pub mod strategy;

pub use strategy::{
    smallest_digit_group, strategy_for, trivial_subset, BatchStrategy, NormalStrategy,
    ShavingStrategy,
};
