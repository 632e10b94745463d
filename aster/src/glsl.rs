//! GLSL program emission.
//!
//! A single pass over the linked pool: structs in dependency order, then
//! boundary declarations, then procedures with callees ahead of callers and
//! `main` last. Expressions fold into strings as the walk encounters their
//! atoms; statements print with four spaces of indentation per nested
//! scope.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use indexmap::IndexMap;
use tracing::error;

use crate::buffer::Buffer;
use crate::error::Error;
use crate::ir::{Atom, ConstructMode, Index, OpCode, QualifierKind, NONE};
use crate::link::{LinkageUnit, ProcEntry};
use crate::transform::type_name::{chain_field, chain_len};

/// The deterministic GLSL identifier of a boundary declaration.
pub fn boundary_name(kind: QualifierKind, binding: u32) -> String {
    match kind {
        QualifierKind::LayoutInSmooth | QualifierKind::LayoutInFlat => format!("_lin{}", binding),
        QualifierKind::LayoutOutSmooth | QualifierKind::LayoutOutFlat => format!("_lout{}", binding),
        QualifierKind::PushConstant => "_pc".to_owned(),
        QualifierKind::Uniform => format!("_ubo{}", binding),
        QualifierKind::StorageBufferRead | QualifierKind::StorageBufferWrite => {
            format!("_sb{}", binding)
        }
        QualifierKind::BufferReference => format!("_ref{}", binding),
        QualifierKind::RayPayload | QualifierKind::RayPayloadIn => format!("_payload{}", binding),
        QualifierKind::HitAttribute => "_hit".to_owned(),
        QualifierKind::Image2D => format!("_image{}", binding),
        QualifierKind::Sampler2D => format!("_sampler{}", binding),
        QualifierKind::AccelerationStructure => format!("_tlas{}", binding),
        QualifierKind::Parameter(slot) => format!("_arg{}", slot),
        QualifierKind::LocalSize => String::new(),
    }
}

pub(crate) fn generate(unit: &LinkageUnit) -> Result<String, Error> {
    let handles = unit.resolve_calls()?;
    let (pool, procedures) = unit.deduplicated();

    for finding in pool.validate() {
        error!(
            target: "aster::glsl",
            kind = ?finding.kind,
            binding = finding.binding,
            "emitting with conflicting layout bindings"
        );
    }

    let mut emitter = ProgramEmitter {
        pool: &pool,
        procedures: &procedures,
        handles,
        struct_order: Vec::new(),
        struct_names: HashMap::new(),
        exprs: HashMap::new(),
        value_types: HashMap::new(),
    };
    emitter.collect_structs();
    emitter.generate()
}

struct ProgramEmitter<'a> {
    pool: &'a Buffer,
    procedures: &'a [ProcEntry],
    handles: HashMap<u32, usize>,
    /// Struct chain heads in dependency order (nested first).
    struct_order: Vec<Index>,
    struct_names: HashMap<Index, String>,
    /// Folded expression strings, keyed by pool index.
    exprs: HashMap<Index, String>,
    /// Resolved type head per value-producing atom.
    value_types: HashMap<Index, Index>,
}

impl<'a> ProgramEmitter<'a> {
    fn is_struct_head(&self, index: Index) -> bool {
        match self.pool.get(index) {
            Some(Atom::TypeField { .. }) => {
                self.pool.struct_names(index).is_some() || chain_len(self.pool.atoms(), index) > 1
            }
            _ => false,
        }
    }

    fn collect_structs(&mut self) {
        let mut roots: Vec<Index> = Vec::new();
        for atom in self.pool.atoms() {
            if matches!(atom, Atom::TypeField { .. }) {
                continue;
            }
            for address in atom.addresses() {
                if self.is_struct_head(address) {
                    roots.push(address);
                }
            }
        }
        for entry in self.procedures {
            for &parameter in &entry.parameters {
                if self.is_struct_head(parameter) {
                    roots.push(parameter);
                }
            }
            if self.is_struct_head(entry.returns) {
                roots.push(entry.returns);
            }
        }

        let mut visited = HashSet::new();
        for root in roots {
            self.visit_struct(root, &mut visited);
        }
    }

    /// Dependency-first walk over nested struct chains.
    fn visit_struct(&mut self, head: Index, visited: &mut HashSet<Index>) {
        if !visited.insert(head) {
            return;
        }

        let mut at = head;
        while let Some(&Atom::TypeField { down, next, .. }) = self.pool.get(at) {
            if down >= 0 && self.is_struct_head(down) {
                self.visit_struct(down, visited);
            }
            if next < 0 {
                break;
            }
            at = next;
        }

        let name = match self.pool.struct_names(head) {
            Some(names) => names.name.to_string(),
            None => format!("anon{}", head),
        };
        self.struct_names.insert(head, name);
        self.struct_order.push(head);
    }

    fn type_string(&self, index: Index) -> Result<String, Error> {
        if index < 0 {
            return Ok("void".to_owned());
        }
        if let Some(name) = self.struct_names.get(&index) {
            return Ok(name.clone());
        }
        match self.pool.get(index) {
            Some(&Atom::Qualifier { underlying, .. }) => self.type_string(underlying),
            Some(&Atom::TypeField { item: Some(item), .. }) => Ok(item.glsl_name().to_owned()),
            Some(&Atom::TypeField { down, .. }) if down >= 0 => self.type_string(down),
            _ => Err(Error::FormatUnsupported(format!("type at %{}", index))),
        }
    }

    fn expr(&self, index: Index) -> Result<&str, Error> {
        self.exprs
            .get(&index)
            .map(|s| s.as_str())
            .ok_or(Error::IndexOutOfRange {
                index,
                size: self.pool.pointer(),
            })
    }

    /// Expression strings of a list chain.
    fn list_exprs(&self, mut at: Index) -> Result<Vec<String>, Error> {
        let mut out = Vec::new();
        while at >= 0 {
            match self.pool.get(at) {
                Some(&Atom::List { item, next }) => {
                    out.push(self.expr(item)?.to_owned());
                    at = next;
                }
                _ => {
                    return Err(Error::IndexOutOfRange {
                        index: at,
                        size: self.pool.pointer(),
                    })
                }
            }
        }
        Ok(out)
    }

    fn generate(&mut self) -> Result<String, Error> {
        let mut out = String::from("#version 460\n");

        let extensions = self.extensions();
        if !extensions.is_empty() {
            out.push('\n');
            for extension in extensions {
                let _ = writeln!(out, "#extension {} : require", extension);
            }
        }

        for &head in &self.struct_order.clone() {
            out.push('\n');
            out.push_str(&self.struct_block(head)?);
        }

        let declarations = self.declarations()?;
        if !declarations.is_empty() {
            out.push('\n');
            out.push_str(&declarations);
        }

        for at in self.procedure_order() {
            out.push('\n');
            let entry = self.procedures[at].clone();
            let body = self.procedure_block(&entry)?;
            out.push_str(&body);
        }

        Ok(out)
    }

    fn extensions(&self) -> Vec<&'static str> {
        let mut ray = false;
        let mut reference = false;
        for atom in self.pool.atoms() {
            if let Atom::Qualifier { kind, .. } = *atom {
                match kind {
                    QualifierKind::RayPayload
                    | QualifierKind::RayPayloadIn
                    | QualifierKind::HitAttribute
                    | QualifierKind::AccelerationStructure => ray = true,
                    QualifierKind::BufferReference => reference = true,
                    _ => {}
                }
            }
        }

        let mut out = Vec::new();
        if ray {
            out.push("GL_EXT_ray_tracing");
        }
        if reference {
            out.push("GL_EXT_buffer_reference");
        }
        out
    }

    fn struct_block(&self, head: Index) -> Result<String, Error> {
        let name = &self.struct_names[&head];
        let registered = self.pool.struct_names(head);

        let mut out = format!("struct {} {{\n", name);
        let mut at = head;
        let mut ordinal = 0usize;
        loop {
            let (item, down, next) = match self.pool.get(at) {
                Some(&Atom::TypeField { item, down, next }) => (item, down, next),
                _ => {
                    return Err(Error::IndexOutOfRange {
                        index: at,
                        size: self.pool.pointer(),
                    })
                }
            };

            let field_type = match item {
                Some(item) => item.glsl_name().to_owned(),
                None => self.type_string(down)?,
            };
            let field_name = registered
                .and_then(|names| names.fields.get(ordinal).map(|f| f.to_string()))
                .unwrap_or_else(|| format!("f{}", ordinal));
            let _ = writeln!(out, "    {} {};", field_type, field_name);

            if next < 0 {
                break;
            }
            at = next;
            ordinal += 1;
        }
        out.push_str("};\n");
        Ok(out)
    }

    fn declarations(&self) -> Result<String, Error> {
        let mut seen: IndexMap<(QualifierKind, u32), Index> = IndexMap::new();
        for atom in self.pool.atoms() {
            if let Atom::Qualifier {
                underlying,
                binding,
                kind,
            } = *atom
            {
                if matches!(kind, QualifierKind::Parameter(_)) {
                    continue;
                }
                seen.entry((kind, binding)).or_insert(underlying);
            }
        }

        let mut out = String::new();
        for (&(kind, binding), &underlying) in &seen {
            let name = boundary_name(kind, binding);
            let line = match kind {
                QualifierKind::LayoutInSmooth => {
                    format!(
                        "layout(location = {}) in {} {};",
                        binding,
                        self.type_string(underlying)?,
                        name
                    )
                }
                QualifierKind::LayoutInFlat => {
                    format!(
                        "layout(location = {}) flat in {} {};",
                        binding,
                        self.type_string(underlying)?,
                        name
                    )
                }
                QualifierKind::LayoutOutSmooth => {
                    format!(
                        "layout(location = {}) out {} {};",
                        binding,
                        self.type_string(underlying)?,
                        name
                    )
                }
                QualifierKind::LayoutOutFlat => {
                    format!(
                        "layout(location = {}) flat out {} {};",
                        binding,
                        self.type_string(underlying)?,
                        name
                    )
                }
                QualifierKind::PushConstant => {
                    format!(
                        "layout(push_constant) uniform _pc_t {{ {} _pc; }};",
                        self.type_string(underlying)?
                    )
                }
                QualifierKind::Uniform => {
                    format!(
                        "layout(binding = {}) uniform {}_t {{ {} {}; }};",
                        binding,
                        name,
                        self.type_string(underlying)?,
                        name
                    )
                }
                QualifierKind::StorageBufferRead => {
                    format!(
                        "layout(binding = {}) readonly buffer {}_t {{ {} {}[]; }};",
                        binding,
                        name,
                        self.type_string(underlying)?,
                        name
                    )
                }
                QualifierKind::StorageBufferWrite => {
                    format!(
                        "layout(binding = {}) buffer {}_t {{ {} {}[]; }};",
                        binding,
                        name,
                        self.type_string(underlying)?,
                        name
                    )
                }
                QualifierKind::BufferReference => {
                    format!(
                        "layout(buffer_reference) buffer {}_t {{ {} {}; }};",
                        name,
                        self.type_string(underlying)?,
                        name
                    )
                }
                QualifierKind::RayPayload => {
                    format!(
                        "layout(location = {}) rayPayloadEXT {} {};",
                        binding,
                        self.type_string(underlying)?,
                        name
                    )
                }
                QualifierKind::RayPayloadIn => {
                    format!(
                        "layout(location = {}) rayPayloadInEXT {} {};",
                        binding,
                        self.type_string(underlying)?,
                        name
                    )
                }
                QualifierKind::HitAttribute => {
                    format!("hitAttributeEXT {} {};", self.type_string(underlying)?, name)
                }
                QualifierKind::Image2D => {
                    format!("layout(binding = {}, rgba32f) uniform image2D {};", binding, name)
                }
                QualifierKind::Sampler2D => {
                    format!("layout(binding = {}) uniform sampler2D {};", binding, name)
                }
                QualifierKind::AccelerationStructure => {
                    format!(
                        "layout(binding = {}) uniform accelerationStructureEXT {};",
                        binding, name
                    )
                }
                QualifierKind::LocalSize => {
                    format!("layout(local_size_x = {}) in;", binding)
                }
                QualifierKind::Parameter(_) => continue,
            };
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Callees ahead of callers, `main` last, added order otherwise.
    fn procedure_order(&self) -> Vec<usize> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();

        fn visit(
            at: usize,
            emitter: &ProgramEmitter,
            visited: &mut HashSet<usize>,
            order: &mut Vec<usize>,
        ) {
            if !visited.insert(at) {
                return;
            }
            let entry = &emitter.procedures[at];
            for i in entry.range.clone() {
                if let Some(&Atom::Call { callable, .. }) = emitter.pool.get(i as Index) {
                    if let Some(&target) = emitter.handles.get(&callable) {
                        visit(target, emitter, visited, order);
                    }
                }
            }
            order.push(at);
        }

        for (at, entry) in self.procedures.iter().enumerate() {
            if entry.name != "main" {
                visit(at, self, &mut visited, &mut order);
            }
        }
        for (at, entry) in self.procedures.iter().enumerate() {
            if entry.name == "main" {
                visit(at, self, &mut visited, &mut order);
            }
        }
        order
    }

    /// The return type: the trailing signature if recorded, otherwise the
    /// first value-carrying `Return` in the body.
    fn return_type(&self, entry: &ProcEntry) -> Result<String, Error> {
        if entry.returns != NONE {
            return self.type_string(entry.returns);
        }
        for i in entry.range.clone() {
            if let Some(&Atom::Return { ty, value }) = self.pool.get(i as Index) {
                if value >= 0 {
                    return self.type_string(ty);
                }
            }
        }
        Ok("void".to_owned())
    }

    fn procedure_block(&mut self, entry: &ProcEntry) -> Result<String, Error> {
        let mut out = String::new();

        if entry.name == "main" {
            out.push_str("void main()\n{\n");
        } else {
            let mut parameters = Vec::new();
            for (slot, &ty) in entry.parameters.iter().enumerate() {
                parameters.push(format!("{} _arg{}", self.type_string(ty)?, slot));
            }
            let _ = writeln!(
                out,
                "{} {}({})",
                self.return_type(entry)?,
                entry.name,
                parameters.join(", ")
            );
            out.push_str("{\n");
        }

        let mut depth = 1usize;
        let mut locals = 0u32;

        let pool = self.pool;
        for i in entry.range.clone() {
            let index = i as Index;
            let atom = pool.fetch(index)?;

            match *atom {
                Atom::TypeField { .. } | Atom::List { .. } | Atom::Qualifier { .. } => {}
                Atom::Primitive(scalar) => {
                    self.exprs.insert(index, scalar.literal());
                }
                Atom::Construct { ty, args, mode } => {
                    self.fold_construct(index, ty, args, mode, depth, &mut locals, &mut out)?;
                }
                Atom::Operation { a, b, code } => {
                    let text = match code {
                        OpCode::Neg => format!("(-{})", self.expr(a)?),
                        OpCode::Subscript => format!("{}[{}]", self.expr(a)?, self.expr(b)?),
                        OpCode::SwzX => format!("{}.x", self.expr(a)?),
                        OpCode::SwzY => format!("{}.y", self.expr(a)?),
                        OpCode::SwzZ => format!("{}.z", self.expr(a)?),
                        OpCode::SwzW => format!("{}.w", self.expr(a)?),
                        _ => {
                            let symbol = code.glsl_symbol().ok_or_else(|| Error::UnsupportedAtom {
                                index,
                                atom: atom.to_string(),
                            })?;
                            format!("({} {} {})", self.expr(a)?, symbol, self.expr(b)?)
                        }
                    };
                    self.exprs.insert(index, text);
                    if let Some(&ty) = self.value_types.get(&a) {
                        self.value_types.insert(index, ty);
                    }
                }
                Atom::Swizzle { src, code } => {
                    let text = format!("{}.{}", self.expr(src)?, code.name());
                    self.exprs.insert(index, text);
                }
                Atom::Load { src, idx } => {
                    let text = if idx >= 0 {
                        let field = self.field_name(src, idx as usize);
                        format!("{}.{}", self.expr(src)?, field)
                    } else {
                        self.expr(src)?.to_owned()
                    };
                    self.exprs.insert(index, text);
                    if idx >= 0 {
                        if let Some(node) = self.field_type(src, idx as usize) {
                            self.value_types.insert(index, node);
                        }
                    }
                }
                Atom::Intrinsic { args, kind, ret } => {
                    let arguments = self.list_exprs(args)?.join(", ");
                    let text = format!("{}({})", kind.glsl_name(), arguments);
                    if kind.is_statement() {
                        self.line(&mut out, depth, &format!("{};", text));
                    } else {
                        self.exprs.insert(index, text);
                        self.value_types.insert(index, ret);
                    }
                }
                Atom::Call { callable, args, ret } => {
                    let target = self.handles[&callable];
                    let arguments = self.list_exprs(args)?.join(", ");
                    let text = format!("{}({})", self.procedures[target].name, arguments);
                    if ret == NONE {
                        self.line(&mut out, depth, &format!("{};", text));
                    } else {
                        self.exprs.insert(index, text);
                        self.value_types.insert(index, ret);
                    }
                }
                Atom::Store { dst, src } => {
                    let statement = format!("{} = {};", self.expr(dst)?, self.expr(src)?);
                    self.line(&mut out, depth, &statement);
                }
                Atom::Cond { cond, .. } => {
                    let statement = format!("if ({}) {{", self.expr(cond)?);
                    self.line(&mut out, depth, &statement);
                    depth += 1;
                }
                Atom::Elif { cond, .. } => {
                    let statement = if cond >= 0 {
                        format!("}} else if ({}) {{", self.expr(cond)?)
                    } else {
                        "} else {".to_owned()
                    };
                    self.line(&mut out, depth.saturating_sub(1).max(1), &statement);
                }
                Atom::While { cond, .. } => {
                    let statement = format!("while ({}) {{", self.expr(cond)?);
                    self.line(&mut out, depth, &statement);
                    depth += 1;
                }
                Atom::End => {
                    depth = depth.saturating_sub(1);
                    self.line(&mut out, depth.max(1), "}");
                }
                Atom::Return { value, .. } => {
                    let statement = if value >= 0 {
                        format!("return {};", self.expr(value)?)
                    } else {
                        "return;".to_owned()
                    };
                    self.line(&mut out, depth, &statement);
                }
            }
        }

        out.push_str("}\n");
        Ok(out)
    }

    fn fold_construct(
        &mut self,
        index: Index,
        ty: Index,
        args: Index,
        mode: ConstructMode,
        depth: usize,
        locals: &mut u32,
        out: &mut String,
    ) -> Result<(), Error> {
        // A construct over a qualifier names the boundary value.
        if let Some(&Atom::Qualifier {
            underlying,
            binding,
            kind,
        }) = self.pool.get(ty)
        {
            self.exprs.insert(index, boundary_name(kind, binding));
            self.value_types.insert(index, underlying);
            return Ok(());
        }

        let type_string = self.type_string(ty)?;
        self.value_types.insert(index, ty);

        let arguments = self.list_exprs(args)?.join(", ");
        match mode {
            ConstructMode::Transient => {
                self.exprs.insert(index, format!("{}({})", type_string, arguments));
            }
            ConstructMode::Normal => {
                let local = format!("s{}", locals);
                *locals += 1;
                let statement = if args == NONE {
                    format!("{} {};", type_string, local)
                } else {
                    format!("{} {} = {}({});", type_string, local, type_string, arguments)
                };
                self.line(out, depth, &statement);
                self.exprs.insert(index, local);
            }
            ConstructMode::Forward => {
                let local = format!("s{}", locals);
                *locals += 1;
                let statement = format!("{} {};", type_string, local);
                self.line(out, depth, &statement);
                self.exprs.insert(index, local);
            }
        }
        Ok(())
    }

    fn field_name(&self, src: Index, ordinal: usize) -> String {
        self.value_types
            .get(&src)
            .and_then(|&head| self.pool.struct_names(head))
            .and_then(|names| names.fields.get(ordinal))
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("f{}", ordinal))
    }

    /// The type head of the `ordinal`-th field of `src`'s struct.
    fn field_type(&self, src: Index, ordinal: usize) -> Option<Index> {
        let &head = self.value_types.get(&src)?;
        let node = chain_field(self.pool.atoms(), head, ordinal)?;
        match self.pool.get(node) {
            Some(&Atom::TypeField { item: Some(_), .. }) => Some(node),
            Some(&Atom::TypeField { down, .. }) if down >= 0 => Some(down),
            _ => None,
        }
    }

    fn line(&self, out: &mut String, depth: usize, text: &str) {
        for _ in 0..depth {
            out.push_str("    ");
        }
        out.push_str(text);
        out.push('\n');
    }
}
