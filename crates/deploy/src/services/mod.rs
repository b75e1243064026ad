//! Services making up a validator cluster.

pub mod node;

pub use node::{
    BlockTime, NODE_CONFIG_FILENAME, NodeCmdBuilder, NodeConfig, NodeRole, ResolvedNode, resolve,
    rewrite_endpoint,
};
