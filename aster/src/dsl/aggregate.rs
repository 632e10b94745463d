//! User-defined aggregate types.
//!
//! A host struct of DSL values becomes a shader structure by describing its
//! layout:
//!
//! ```
//! use aster::dsl::{field, AggregateLayout, Mat4, ShaderType};
//! use aster::ir::Index;
//!
//! #[derive(Copy, Clone)]
//! struct Mvp {
//!     model: Mat4,
//!     view: Mat4,
//!     proj: Mat4,
//! }
//!
//! impl ShaderType for Mvp {
//!     fn type_index() -> Index {
//!         AggregateLayout::named("MVP")
//!             .field::<Mat4>("model")
//!             .field::<Mat4>("view")
//!             .field::<Mat4>("proj")
//!             .emit()
//!     }
//!
//!     fn from_base(base: Index) -> Self {
//!         Mvp {
//!             model: field(base, 0),
//!             view: field(base, 1),
//!             proj: field(base, 2),
//!         }
//!     }
//! }
//! ```

use smol_str::SmolStr;

use crate::buffer::StructNames;
use crate::dsl::{ArgPack, ProcReturn, ScalarArg, ShaderType, Value};
use crate::emitter::Emitter;
use crate::ir::{ConstructMode, Index, NONE};

/// Builder describing an aggregate's name and field list.
pub struct AggregateLayout {
    name: SmolStr,
    fields: Vec<(SmolStr, fn() -> Index)>,
}

impl AggregateLayout {
    pub fn named(name: &str) -> AggregateLayout {
        AggregateLayout {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field<T: ShaderType>(mut self, name: &str) -> AggregateLayout {
        self.fields.push((name.into(), T::type_index as fn() -> Index));
        self
    }

    /// Emits the structure's field chain once per buffer and registers its
    /// names; later calls return the cached head.
    pub fn emit(self) -> Index {
        if let Some(head) = Emitter::cached_struct(&self.name) {
            return head;
        }

        let types: Vec<Index> = self.fields.iter().map(|(_, emit)| emit()).collect();

        // Chain nodes link front to back, so they are emitted in reverse.
        let mut next = NONE;
        for &ty in types.iter().rev() {
            next = Emitter::emit_type_field(None, ty, next);
        }
        let head = next;

        Emitter::register_struct(
            head,
            StructNames {
                name: self.name,
                fields: self.fields.into_iter().map(|(name, _)| name).collect(),
            },
        );

        head
    }
}

/// Materializes the `ordinal`-th field of the aggregate value at `base`.
pub fn field<T: Value>(base: Index, ordinal: i32) -> T {
    T::from_index(Emitter::emit_load(base, ordinal))
}

/// An aggregate value: the materialized fields plus the index of the value
/// they were loaded from, which is what stores and returns refer to.
pub struct Composite<T: ShaderType> {
    value: T,
    base: Index,
}

impl<T: ShaderType> Composite<T> {
    pub fn from_base(base: Index) -> Composite<T> {
        Composite {
            value: T::from_base(base),
            base,
        }
    }

    pub fn base_index(&self) -> Index {
        self.base
    }
}

impl<T: ShaderType> std::ops::Deref for Composite<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: ShaderType + Clone> Clone for Composite<T> {
    fn clone(&self) -> Self {
        Composite {
            value: self.value.clone(),
            base: self.base,
        }
    }
}

impl<T: ShaderType + Copy> Copy for Composite<T> {}

impl<T: ShaderType> ProcReturn for Composite<T> {
    fn record_return(self) -> Index {
        let ty = T::type_index();
        Emitter::emit_return(self.base, ty);
        ty
    }
}

impl<T: ShaderType> ScalarArg for Composite<T> {
    fn record(self) -> Index {
        self.base
    }
}

/// Constructs an aggregate value from recorded arguments.
pub fn construct<T: ShaderType>(args: impl ArgPack) -> Composite<T> {
    let list = crate::dsl::record_args(args);
    let ty = T::type_index();
    let base = Emitter::emit_construct(ty, list, ConstructMode::Normal);
    Composite::from_base(base)
}
