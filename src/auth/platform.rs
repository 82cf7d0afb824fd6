use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Singleton resource that platform-wide permissions hang off.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Platform {
    id: Uuid,
}

impl PolarClass for Platform {
    fn get_polar_class_builder() -> oso::ClassBuilder<Platform> {
        oso::Class::builder()
            .name("Platform")
            .add_attribute_getter("id", |recv: &Platform| recv.id)
            .add_class_method("default", <Platform as Default>::default)
    }

    fn get_polar_class() -> oso::Class {
        let builder = Platform::get_polar_class_builder();
        builder.build()
    }
}
