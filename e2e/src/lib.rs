#[cfg(test)]
mod canonicalize;
#[cfg(test)]
mod config;
#[cfg(test)]
mod persisted_operations;
#[cfg(test)]
mod testkit;
#[cfg(test)]
mod warmup;
