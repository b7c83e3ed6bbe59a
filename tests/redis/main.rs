mod lists;
mod pub_sub;
mod replication;
mod streams;
mod strings;
mod test_utils;
mod transactions;
