use crate::object::{Object, ObjectId, ObjectKind, ParamMode};
use crate::ty::Type;
use indexmap::IndexMap;

/// Handle of a scope inside the symbol table's scope arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) usize);

/// One namespace level: the names declared in it, in declaration order,
/// a link to the lexically enclosing scope, and the subroutine or
/// program object the scope belongs to.
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub owner: Option<ObjectId>,
    symbols: IndexMap<String, ObjectId>,
}

impl Scope {
    fn new(parent: Option<ScopeId>, owner: Option<ObjectId>) -> Self {
        Self {
            parent,
            owner,
            symbols: IndexMap::default(),
        }
    }

    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.symbols.values().copied()
    }
}

/// All scopes and objects of one compilation, addressed by index
/// handles, plus the stack of scopes mirroring the parser's current
/// descent path. Everything is append-only for the duration of the pass
/// and dropped together afterwards.
#[derive(Default, Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    objects: Vec<Object>,
    stack: Vec<ScopeId>,
    program: Option<ObjectId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.0]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn program(&self) -> Option<ObjectId> {
        self.program
    }

    /// The scope names are currently being declared into and resolved
    /// against.
    pub fn current_scope(&self) -> Option<ScopeId> {
        self.stack.last().copied()
    }

    pub fn enter_scope(&mut self, scope: ScopeId) {
        self.stack.push(scope);
    }

    /// Objects of the popped scope stay reachable through the arena for
    /// the final dump; they just stop being visible to name resolution.
    pub fn exit_scope(&mut self) {
        self.stack.pop();
    }

    /// Puts an object into the arena without binding its name anywhere.
    pub fn alloc(&mut self, object: Object) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(object);
        id
    }

    /// Binds an allocated object's name in the current scope. The caller
    /// has already checked the name is fresh there.
    pub fn declare(&mut self, id: ObjectId) {
        let Some(scope) = self.current_scope() else {
            return;
        };
        let name = self.objects[id.0].name.clone();
        self.scopes[scope.0].symbols.insert(name, id);
    }

    /// The program object is the root of the scope tree; it is not
    /// declared into any scope.
    pub fn create_program(&mut self, name: String) -> ObjectId {
        let object_id = ObjectId(self.objects.len());
        let scope_id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(self.current_scope(), Some(object_id)));
        self.objects.push(Object {
            name,
            kind: ObjectKind::Program { scope: scope_id },
        });
        self.program = Some(object_id);
        object_id
    }

    pub fn create_function(&mut self, name: String) -> ObjectId {
        let object_id = ObjectId(self.objects.len());
        let scope_id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(self.current_scope(), Some(object_id)));
        self.objects.push(Object {
            name,
            kind: ObjectKind::Function {
                params: Vec::default(),
                return_type: None,
                scope: scope_id,
            },
        });
        object_id
    }

    pub fn create_procedure(&mut self, name: String) -> ObjectId {
        let object_id = ObjectId(self.objects.len());
        let scope_id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(self.current_scope(), Some(object_id)));
        self.objects.push(Object {
            name,
            kind: ObjectKind::Procedure {
                params: Vec::default(),
                scope: scope_id,
            },
        });
        object_id
    }

    pub fn scope_of(&self, id: ObjectId) -> Option<ScopeId> {
        match self.objects[id.0].kind {
            ObjectKind::Program { scope }
            | ObjectKind::Function { scope, .. }
            | ObjectKind::Procedure { scope, .. } => Some(scope),
            _ => None,
        }
    }

    pub fn push_param(&mut self, owner: ObjectId, param: ObjectId) {
        match &mut self.objects[owner.0].kind {
            ObjectKind::Function { params, .. } | ObjectKind::Procedure { params, .. } => {
                params.push(param)
            }
            _ => {}
        }
    }

    pub fn set_return_type(&mut self, func: ObjectId, ty: Type) {
        if let ObjectKind::Function { return_type, .. } = &mut self.objects[func.0].kind {
            *return_type = Some(ty);
        }
    }

    pub fn parameter_info(&self, id: ObjectId) -> Option<(Type, ParamMode)> {
        match &self.objects[id.0].kind {
            ObjectKind::Parameter { ty, mode } => Some((ty.clone(), *mode)),
            _ => None,
        }
    }

    /// True when the name is already taken in the *current* scope.
    /// Shadowing an outer declaration is fine.
    pub fn declared_in_current(&self, name: &str) -> bool {
        self.current_scope()
            .map(|scope| self.scopes[scope.0].symbols.contains_key(name))
            .unwrap_or(false)
    }

    /// Resolves a name against the current scope and then each enclosing
    /// scope outward. Names compare case sensitively.
    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        let mut next = self.current_scope();
        while let Some(scope) = next {
            let scope = &self.scopes[scope.0];
            if let Some(id) = scope.symbols.get(name) {
                return Some(*id);
            }
            next = scope.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_lookup() {
        let mut symtab = SymbolTable::new();
        let program = symtab.create_program("main".to_string());
        let scope = symtab.scope_of(program).unwrap();
        symtab.enter_scope(scope);

        let a = symtab.alloc(Object::variable("a".to_string(), Type::Int));
        symtab.declare(a);

        assert_eq!(symtab.lookup("a"), Some(a));
        assert_eq!(symtab.lookup("b"), None);
        assert!(symtab.declared_in_current("a"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut symtab = SymbolTable::new();
        let program = symtab.create_program("main".to_string());
        symtab.enter_scope(symtab.scope_of(program).unwrap());

        let a = symtab.alloc(Object::variable("Count".to_string(), Type::Int));
        symtab.declare(a);

        assert_eq!(symtab.lookup("Count"), Some(a));
        assert_eq!(symtab.lookup("count"), None);
        assert_eq!(symtab.lookup("COUNT"), None);
    }

    #[test]
    fn test_shadowing_in_nested_scope() {
        let mut symtab = SymbolTable::new();
        let program = symtab.create_program("main".to_string());
        symtab.enter_scope(symtab.scope_of(program).unwrap());

        let outer = symtab.alloc(Object::variable("x".to_string(), Type::Int));
        symtab.declare(outer);

        let func = symtab.create_function("f".to_string());
        symtab.declare(func);
        symtab.enter_scope(symtab.scope_of(func).unwrap());

        // Not a redeclaration: the outer x lives in a different scope.
        assert!(!symtab.declared_in_current("x"));
        let inner = symtab.alloc(Object::variable("x".to_string(), Type::Float));
        symtab.declare(inner);

        assert_eq!(symtab.lookup("x"), Some(inner));
        symtab.exit_scope();
        assert_eq!(symtab.lookup("x"), Some(outer));
    }

    #[test]
    fn test_exited_scope_objects_stay_reachable() {
        let mut symtab = SymbolTable::new();
        let program = symtab.create_program("main".to_string());
        symtab.enter_scope(symtab.scope_of(program).unwrap());

        let func = symtab.create_function("f".to_string());
        symtab.declare(func);
        let func_scope = symtab.scope_of(func).unwrap();
        symtab.enter_scope(func_scope);
        let local = symtab.alloc(Object::variable("tmp".to_string(), Type::Char));
        symtab.declare(local);
        symtab.exit_scope();

        assert_eq!(symtab.lookup("tmp"), None);
        let reachable: Vec<ObjectId> = symtab.scope(func_scope).objects().collect();
        assert_eq!(reachable, vec![local]);
    }

    #[test]
    fn test_params_recorded_in_order() {
        let mut symtab = SymbolTable::new();
        let program = symtab.create_program("main".to_string());
        symtab.enter_scope(symtab.scope_of(program).unwrap());

        let func = symtab.create_function("f".to_string());
        symtab.declare(func);
        symtab.enter_scope(symtab.scope_of(func).unwrap());

        let p1 = symtab.alloc(Object::parameter(
            "a".to_string(),
            Type::Int,
            ParamMode::Value,
        ));
        symtab.declare(p1);
        symtab.push_param(func, p1);
        let p2 = symtab.alloc(Object::parameter(
            "b".to_string(),
            Type::Char,
            ParamMode::Reference,
        ));
        symtab.declare(p2);
        symtab.push_param(func, p2);
        symtab.set_return_type(func, Type::Int);

        let ObjectKind::Function {
            params,
            return_type,
            ..
        } = &symtab.object(func).kind
        else {
            panic!("not a function");
        };
        assert_eq!(params, &vec![p1, p2]);
        assert_eq!(return_type, &Some(Type::Int));
        assert_eq!(
            symtab.parameter_info(p2),
            Some((Type::Char, ParamMode::Reference))
        );
    }
}
