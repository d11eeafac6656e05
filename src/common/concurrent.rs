pub(crate) mod constants;
pub(crate) mod epoch_cell;

pub(crate) use epoch_cell::EpochCell;
