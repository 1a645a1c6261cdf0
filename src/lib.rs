/*!
# SF Save

SF Save is a library to ergonomically work with Satisfactory saves: it
decodes the binary `.sav` container (object catalog, per-object data blocks,
and the tagged property system) and re-encodes it so the game engine accepts
the result. Re-serializing unmodified data reproduces the original headers
byte for byte; data-block lengths are recomputed.

```rust
use sfsave::{
    ObjectHeader, ObjectReference, Property, PropertyValue, SatisfactorySave, SaveObject,
};

let actor = SaveObject::new(ObjectHeader::Actor {
    type_path: "/Game/FactoryGame/Buildable/Factory/SmelterMk1/Build_SmelterMk1.Build_SmelterMk1_C".to_string(),
    instance: ObjectReference::new("Persistent_Level", "Persistent_Level:PersistentLevel.Build_SmelterMk1_1"),
    transform: None,
    was_placed_in_level: true,
});

let mut component = SaveObject::new(ObjectHeader::Component {
    type_path: "/Script/FactoryGame.FGInventoryComponent".to_string(),
    instance: ObjectReference::new("Persistent_Level", "Persistent_Level:PersistentLevel.Build_SmelterMk1_1.InputInventory"),
    parent_entity_name: "Persistent_Level:PersistentLevel.Build_SmelterMk1_1".to_string(),
});
component.properties.push(Property::new("mAdjustedSizeDiff", PropertyValue::Int(-2)));

let save = SatisfactorySave {
    root_object: "Persistent_Level".to_string(),
    world_arguments: "?startloc=Grass Fields?sessionName=example?Visibility=SV_Private".to_string(),
    save_name: "example".to_string(),
    unknown_header_int1: 158,
    unknown_header_bytes: [0; 9],
    objects: vec![actor, component],
    unknown_map: Vec::new(),
};

let mut bytes = Vec::new();
save.write(&mut bytes)?;
let decoded = SatisfactorySave::from_slice(&bytes)?;
assert_eq!(decoded, save);
# Ok::<(), Box<dyn std::error::Error>>(())
```

Unknown property type names are a hard error (`UnknownPropertyType`): the
format cannot be skipped over without losing bytes a faithful re-encode
would need, so guessing is worse than failing.
*/

mod codec;
mod errors;
mod object;
mod property;
mod save;

pub use errors::*;
pub use object::*;
pub use property::*;
pub use save::*;
