use proc_macro::TokenStream as TokenStream1;
use quote::ToTokens;
use syn::{self, parse_quote};

/// This macro is added before a method of `Round` struct in the impl block.
/// Use this macro to first check if current round phase is exactly the phase in
/// the attribute.
///
/// For example, `#[allowed_phase(Play)]` will make a method first check
/// if current round phase is `Play`. If not, the method will return
/// `Error::WrongPhase` naming the method, the expected and the actual phase.
///
/// The annotated method must return `crate::Result<_>` and the enclosing
/// module must have `RoundPhase` in scope.
#[proc_macro_attribute]
pub fn allowed_phase(attr: TokenStream1, item: TokenStream1) -> TokenStream1 {
    let mut ast: syn::ImplItemFn = match syn::parse(item) {
        Ok(ast) => ast,
        Err(err) => return err.to_compile_error().into(),
    };
    let phase: syn::Ident = match syn::parse(attr) {
        Ok(phase) => phase,
        Err(err) => return err.to_compile_error().into(),
    };
    let operation = ast.sig.ident.to_string();

    let early_return: syn::Stmt = parse_quote! {
        if self.phase != RoundPhase::#phase {
            return Err(crate::Error::WrongPhase {
                operation: #operation,
                expected: RoundPhase::#phase,
                actual: self.phase,
            });
        }
    };
    ast.block.stmts.insert(0, early_return);
    ast.into_token_stream().into()
}
