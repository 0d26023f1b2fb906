//! Command structs for listing operations.
//!
//! These types group the fields of a listing for `add_item`/`update_item`,
//! keeping call sites readable and avoiding long argument lists.

/// Create a new listing in `Initial` status.
#[derive(Clone, Debug)]
pub struct NewItemCmd {
    pub name: String,
    pub price: i64,
    pub description: String,
    pub category_id: i64,
    pub image: Vec<u8>,
}

impl NewItemCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, price: i64, category_id: i64) -> Self {
        Self {
            name: name.into(),
            price,
            description: String::new(),
            category_id,
            image: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn image(mut self, image: Vec<u8>) -> Self {
        self.image = image;
        self
    }
}

/// Replace every editable field of an existing listing.
///
/// Status and seller are never touched by an update.
#[derive(Clone, Debug)]
pub struct UpdateItemCmd {
    pub name: String,
    pub price: i64,
    pub description: String,
    pub category_id: i64,
    pub image: Vec<u8>,
}

impl UpdateItemCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, price: i64, category_id: i64) -> Self {
        Self {
            name: name.into(),
            price,
            description: String::new(),
            category_id,
            image: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn image(mut self, image: Vec<u8>) -> Self {
        self.image = image;
        self
    }
}

impl From<NewItemCmd> for UpdateItemCmd {
    fn from(cmd: NewItemCmd) -> Self {
        Self {
            name: cmd.name,
            price: cmd.price,
            description: cmd.description,
            category_id: cmd.category_id,
            image: cmd.image,
        }
    }
}
