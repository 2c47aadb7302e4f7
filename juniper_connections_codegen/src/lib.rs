use proc_macro::TokenStream;
use proc_macro2::{Ident, Span};
use quote::quote;
use syn::{Data, DeriveInput, parse_macro_input};

/// Macro that will generate Connection and Edge structs for you to use when returning lists.
///
/// For a node `Location` this generates:
///
/// - `LocationRelayConnection`, exposed to GraphQL as `LocationConnection`, implementing
///   `juniper_connections::RelayConnection` with `TYPE_TAG = "LocationConnection"`.
/// - `LocationRelayEdge`, exposed to GraphQL as `LocationEdge`, implementing
///   `juniper_connections::RelayEdge`.
/// - `From` conversions from the generic `Connection<Location>` and `Edge<Location>`. The total
///   count saturates at `i32::MAX`.
///
/// The generated types take the node's visibility.
///
/// Nodes resolved against a Juniper context need the generated types to share it:
///
/// ```nocompile
/// #[derive(RelayConnection, Debug, Clone, Eq, PartialEq)]
/// #[relay_connection(context = Context)]
/// struct Character { ... }
/// ```
#[proc_macro_derive(RelayConnection, attributes(relay_connection))]
pub fn macro_relay_connection_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let mut context: Option<syn::Type> = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("relay_connection") {
            continue;
        }
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("context") {
                context = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `context = Type`"))
            }
        });
        if let Err(err) = parsed {
            return err.to_compile_error().into();
        }
    }
    let context_attr = context.map(|ctx| quote! { context = #ctx, });

    let out = match input.data {
        Data::Struct(_s) => {
            let connection_gql_name = format!("{}Connection", input.ident);
            let connection_gql_desc = format!("Provides paginated {} data.", input.ident);
            let total_count_desc = format!(
                "Total number of {} items, capped at 2147483647.",
                input.ident
            );
            let edge_gql_name = format!("{}Edge", input.ident);
            let edge_gql_desc = format!(
                "Provides {} item and a cursor to its position.",
                input.ident
            );
            let cursor_desc = format!("The position of this {} item.", input.ident);
            let connection_name = Ident::new(
                &format!("{}RelayConnection", input.ident),
                Span::mixed_site(),
            );
            let edge_name = Ident::new(&format!("{}RelayEdge", input.ident), Span::mixed_site());
            let vis = input.vis;
            let struct_name = input.ident;

            quote! {
                #[derive(juniper::GraphQLObject, Debug, Clone, Eq, PartialEq)]
                #[graphql(
                    #context_attr
                    name = #connection_gql_name,
                    description = #connection_gql_desc
                )]
                #vis struct #connection_name {
                    /// Saturates at `i32::MAX` when converted from a larger `Connection`.
                    #[graphql(description = #total_count_desc)]
                    pub total_count: i32,
                    pub page_info: juniper_connections::PageInfo,
                    pub edges: Vec<#edge_name>,
                }

                impl juniper_connections::RelayConnection for #connection_name {
                    type EdgeType = #edge_name;
                    type NodeType = #struct_name;

                    const TYPE_TAG: &'static str = #connection_gql_name;
                }

                impl From<juniper_connections::Connection<#struct_name>> for #connection_name {
                    fn from(connection: juniper_connections::Connection<#struct_name>) -> Self {
                        Self {
                            total_count: i32::try_from(connection.total_count).unwrap_or(i32::MAX),
                            page_info: connection.page_info,
                            edges: connection.edges.into_iter().map(#edge_name::from).collect(),
                        }
                    }
                }

                #[derive(juniper::GraphQLObject, Debug, Clone, Eq, PartialEq)]
                #[graphql(
                    #context_attr
                    name = #edge_gql_name,
                    description = #edge_gql_desc
                )]
                #vis struct #edge_name {
                    #[graphql(description = #cursor_desc)]
                    pub cursor: String,
                    pub node: #struct_name,
                }

                impl juniper_connections::RelayEdge for #edge_name {
                    type NodeType = #struct_name;

                    fn new(node: Self::NodeType, cursor: String) -> Self {
                        Self { cursor, node }
                    }
                }

                impl From<juniper_connections::Edge<#struct_name>> for #edge_name {
                    fn from(edge: juniper_connections::Edge<#struct_name>) -> Self {
                        Self {
                            cursor: edge.cursor,
                            node: edge.node,
                        }
                    }
                }
            }
        }
        _ => syn::Error::new_spanned(
            &input.ident,
            "RelayConnection can only be derived for structs",
        )
        .to_compile_error(),
    };

    out.into()
}
