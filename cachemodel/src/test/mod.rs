mod policies;
mod properties;
