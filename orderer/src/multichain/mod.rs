/*!
Channel registry of the ordering node.

```text
                 +-----------------------------------------+
   get_chain --> | ArcSwap<HashMap<channel id, ChainSupport>> | <-- admit_channel
                 +-------------------+---------------------+     (copy, insert,
                                     |                            start, swap)
              +----------------------+---------------------+
              |                      |                     |
      +-------v-------+      +-------v-------+     +-------v-------+
      | ChainSupport  |      | ChainSupport  |     | ChainSupport  |
      | (system)      |      | (standard)    |     | (standard)    |
      +---+-------+---+      +---+-------+---+     +---+-------+---+
          |       |              |       |             |       |
     config    ledger       config    ledger      config    ledger
```

Exactly one channel, the system channel, carries the consortiums
definitions. New channels are planned against its configuration with
[`Manager::new_channel_config`] and committed with
[`Manager::admit_channel`].
*/

mod chain_support;
mod error;
mod manager;
mod new_channel;
mod resources;

pub use self::{
    chain_support::{ChainKind, ChainSupport},
    error::{AdmitError, BootstrapError, CreationError, SupportError},
    manager::Manager,
    new_channel::{config_tx_from_manager, new_channel_config},
    resources::{ConfigResources, LedgerResources},
};

/// message format version of the envelopes produced by the registry
pub const MSG_VERSION: i32 = 0;
pub const EPOCH: u64 = 0;
