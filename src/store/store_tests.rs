use super::*;
use std::str::FromStr;

use rusqlite::Connection;
use rust_decimal::Decimal;

use super::catalog::{CategoriaRecord, ProductoRecord};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn mem() -> Store {
    Store::open_in_memory().unwrap()
}

fn seed_producto(conn: &Connection, id: &str, name: &str, category: Option<&str>) {
    catalog::insert_producto(
        conn,
        &ProductoRecord {
            product_id: id.to_string(),
            image: None,
            category_id: category.map(|s| s.to_string()),
            id_user: None,
            product_name: name.to_string(),
            description: None,
            state: 1,
            price: dec("10.00"),
        },
    )
    .unwrap();
}

#[test]
fn schema_is_idempotent() {
    let store = mem();
    store.conn().execute_batch(schema::SCHEMA_SQL).unwrap();
}

#[test]
fn username_unique_email_not() {
    let store = mem();
    let conn = store.conn();
    accounts::insert_user(conn, "ana", "ana@x.com", "h", "Ana", "").unwrap();
    let dup = accounts::insert_user(conn, "ana", "other@x.com", "h", "", "");
    match dup {
        Err(StoreError::UniqueViolation { constraint }) => {
            assert_eq!(constraint, "auth_user.username");
        }
        other => panic!("expected unique violation, got {other:?}"),
    }
    // Same email under a different username is allowed at the storage layer.
    accounts::insert_user(conn, "ana2", "ana@x.com", "h", "", "").unwrap();
    assert!(accounts::email_exists(conn, "ana@x.com").unwrap());
    assert!(!accounts::email_exists(conn, "ANA@X.COM").unwrap());
}

#[test]
fn ci_lookups_match_any_case() {
    let store = mem();
    let conn = store.conn();
    let u = accounts::insert_user(conn, "Ana", "Ana@X.com", "h", "Ana", "Lopez").unwrap();
    assert_eq!(accounts::user_by_email_ci(conn, "ana@x.COM").unwrap().unwrap().id, u.id);
    assert_eq!(accounts::user_by_username_ci(conn, "ANA").unwrap().unwrap().id, u.id);
    assert!(accounts::user_by_email_ci(conn, "nadie@x.com").unwrap().is_none());
}

#[test]
fn token_get_or_create_is_idempotent() {
    let store = mem();
    let conn = store.conn();
    let u = accounts::insert_user(conn, "ana", "ana@x.com", "h", "", "").unwrap();
    let first = tokens::get_or_create_token(conn, u.id, "aaaa1111aaaa1111aaaa1111aaaa1111aaaa1111").unwrap();
    let second = tokens::get_or_create_token(conn, u.id, "bbbb2222bbbb2222bbbb2222bbbb2222bbbb2222").unwrap();
    assert_eq!(first, "aaaa1111aaaa1111aaaa1111aaaa1111aaaa1111");
    assert_eq!(first, second);
    let found = tokens::user_by_token(conn, &first).unwrap().unwrap();
    assert_eq!(found.id, u.id);
    assert!(tokens::user_by_token(conn, "cccc3333cccc3333cccc3333cccc3333cccc3333").unwrap().is_none());
}

#[test]
fn profile_get_or_create_returns_defaults_then_updates() {
    let store = mem();
    let conn = store.conn();
    let u = accounts::insert_user(conn, "ana", "ana@x.com", "h", "", "").unwrap();
    let p = profiles::get_or_create_profile(conn, u.id).unwrap();
    assert_eq!(p.rating, Some(dec("0.00")));
    assert_eq!(p.products_sold, Some(0));
    assert!(p.phone.is_none());

    let mut updated = p.clone();
    updated.phone = Some("555-0100".to_string());
    updated.rating = Some(dec("4.50"));
    profiles::update_profile(conn, &updated).unwrap();

    // A second get-or-create must return the stored row, not a fresh one.
    let again = profiles::get_or_create_profile(conn, u.id).unwrap();
    assert_eq!(again.phone.as_deref(), Some("555-0100"));
    assert_eq!(again.rating, Some(dec("4.50")));
}

#[test]
fn deleting_account_cascades_token_and_profile() {
    let store = mem();
    let conn = store.conn();
    let u = accounts::insert_user(conn, "ana", "ana@x.com", "h", "", "").unwrap();
    let key = tokens::get_or_create_token(conn, u.id, "aaaa1111aaaa1111aaaa1111aaaa1111aaaa1111").unwrap();
    profiles::get_or_create_profile(conn, u.id).unwrap();

    conn.execute("DELETE FROM auth_user WHERE id = ?1", rusqlite::params![u.id]).unwrap();
    assert!(tokens::user_by_token(conn, &key).unwrap().is_none());
    let left: i64 = conn
        .query_row("SELECT COUNT(*) FROM user_profile WHERE user_id = ?1", rusqlite::params![u.id], |r| r.get(0))
        .unwrap();
    assert_eq!(left, 0);
}

#[test]
fn search_is_substring_case_insensitive_and_literal() {
    let store = mem();
    let conn = store.conn();
    seed_producto(conn, "p1", "Silla Gamer", None);
    seed_producto(conn, "p2", "Mesa de madera", None);
    seed_producto(conn, "p3", "100%_cotton shirt", None);

    let hits = catalog::list_productos(conn, Some("silla")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].product_id, "p1");

    // Wildcards in the term must match literally, not as patterns.
    let hits = catalog::list_productos(conn, Some("%_")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].product_id, "p3");

    assert_eq!(catalog::list_productos(conn, None).unwrap().len(), 3);
}

#[test]
fn category_listing_is_exact_match() {
    let store = mem();
    let conn = store.conn();
    catalog::insert_categoria(conn, &CategoriaRecord { category_id: "cat-1".into(), category_name: "Muebles".into() }).unwrap();
    catalog::insert_categoria(conn, &CategoriaRecord { category_id: "cat-10".into(), category_name: "Otros".into() }).unwrap();
    seed_producto(conn, "p1", "Silla", Some("cat-1"));
    seed_producto(conn, "p2", "Mesa", Some("cat-10"));

    let hits = catalog::productos_by_category(conn, "cat-1").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].product_id, "p1");
}

#[test]
fn duplicate_line_item_rejected_and_original_intact() {
    let store = mem();
    let conn = store.conn();
    seed_producto(conn, "p1", "Silla", None);
    let pedido = orders::insert_pedido(conn, dec("0.00"), "Pendiente", None).unwrap();
    let original = orders::insert_detalle(conn, pedido.id, "p1", 2, dec("10.00")).unwrap();

    let dup = orders::insert_detalle(conn, pedido.id, "p1", 5, dec("99.99"));
    match dup {
        Err(StoreError::UniqueViolation { constraint }) => {
            assert_eq!(constraint, "detalle.pedido_id, detalle.producto_id");
        }
        other => panic!("expected unique violation, got {other:?}"),
    }

    let kept = orders::detalle_by_id(conn, original.id).unwrap().unwrap();
    assert_eq!(kept.cantidad, 2);
    assert_eq!(kept.precio_unidad, dec("10.00"));
}

#[test]
fn product_delete_leaves_dangling_line_and_clears_gallery() {
    let store = mem();
    let conn = store.conn();
    seed_producto(conn, "p1", "Silla", None);
    catalog::attach_imagen(conn, "p1", "productos/a.png").unwrap();
    let pedido = orders::insert_pedido(conn, dec("0.00"), "Pendiente", None).unwrap();
    let line = orders::insert_detalle(conn, pedido.id, "p1", 1, dec("10.00")).unwrap();

    catalog::delete_producto(conn, "p1").unwrap();

    assert!(catalog::producto_by_id(conn, "p1").unwrap().is_none());
    assert!(catalog::imagenes_for(conn, "p1").unwrap().is_empty());
    // The line survives with a dangling product reference.
    let kept = orders::detalle_by_id(conn, line.id).unwrap().unwrap();
    assert_eq!(kept.producto_id, "p1");
    let joined = orders::detalles_for_pedido(conn, pedido.id).unwrap();
    assert_eq!(joined.len(), 1);
    assert!(joined[0].1.is_none());
}

#[test]
fn product_delete_nulls_message_reference() {
    let store = mem();
    let conn = store.conn();
    seed_producto(conn, "p1", "Silla", None);
    let v = messages::insert_vendedor(conn, "Carlos", None).unwrap();
    let m = messages::insert_mensaje(conn, v.id, 7, Some("p1"), "¿Sigue disponible?", false).unwrap();

    catalog::delete_producto(conn, "p1").unwrap();

    let kept = messages::mensaje_by_id(conn, m.id).unwrap().unwrap();
    assert!(kept.producto_id.is_none());
    assert_eq!(kept.texto, "¿Sigue disponible?");
}

#[test]
fn seller_delete_cascades_messages() {
    let store = mem();
    let conn = store.conn();
    let v = messages::insert_vendedor(conn, "Carlos", None).unwrap();
    let m = messages::insert_mensaje(conn, v.id, 7, None, "hola", true).unwrap();
    messages::delete_vendedor(conn, v.id).unwrap();
    assert!(messages::mensaje_by_id(conn, m.id).unwrap().is_none());
}

#[test]
fn referenced_category_cannot_be_deleted() {
    let store = mem();
    let conn = store.conn();
    catalog::insert_categoria(conn, &CategoriaRecord { category_id: "cat-1".into(), category_name: "Muebles".into() }).unwrap();
    seed_producto(conn, "p1", "Silla", Some("cat-1"));

    match catalog::delete_categoria(conn, "cat-1") {
        Err(StoreError::ForeignKeyViolation) => {}
        other => panic!("expected fk violation, got {other:?}"),
    }

    catalog::delete_producto(conn, "p1").unwrap();
    catalog::delete_categoria(conn, "cat-1").unwrap();
}

#[test]
fn order_delete_cascades_lines() {
    let store = mem();
    let conn = store.conn();
    seed_producto(conn, "p1", "Silla", None);
    let pedido = orders::insert_pedido(conn, dec("20.00"), "Pendiente", Some("urgente")).unwrap();
    let line = orders::insert_detalle(conn, pedido.id, "p1", 2, dec("10.00")).unwrap();
    orders::delete_pedido(conn, pedido.id).unwrap();
    assert!(orders::detalle_by_id(conn, line.id).unwrap().is_none());
}

#[test]
fn order_update_never_touches_amount_or_timestamp() {
    let store = mem();
    let conn = store.conn();
    let pedido = orders::insert_pedido(conn, dec("150.00"), "Pendiente", None).unwrap();
    orders::update_pedido(conn, pedido.id, "Completado", Some("entregado")).unwrap();
    let after = orders::pedido_by_id(conn, pedido.id).unwrap().unwrap();
    assert_eq!(after.monto_total, dec("150.00"));
    assert_eq!(after.fecha_pedido, pedido.fecha_pedido);
    assert_eq!(after.estado, "Completado");
    assert_eq!(after.comentario.as_deref(), Some("entregado"));
}

#[test]
fn gallery_delete_is_scoped_to_owner() {
    let store = mem();
    let conn = store.conn();
    seed_producto(conn, "p1", "Silla", None);
    seed_producto(conn, "p2", "Mesa", None);
    let own = catalog::attach_imagen(conn, "p1", "a.png").unwrap();
    let foreign = catalog::attach_imagen(conn, "p2", "b.png").unwrap();

    let removed = catalog::delete_imagenes(conn, "p1", &[own.id, foreign.id, 9999]).unwrap();
    assert_eq!(removed, 1);
    assert!(catalog::imagenes_for(conn, "p1").unwrap().is_empty());
    assert_eq!(catalog::imagenes_for(conn, "p2").unwrap().len(), 1);
}

#[test]
fn message_filters_are_exact() {
    let store = mem();
    let conn = store.conn();
    seed_producto(conn, "p1", "Silla", None);
    let v1 = messages::insert_vendedor(conn, "Carlos", None).unwrap();
    let v2 = messages::insert_vendedor(conn, "Maria", Some("vendedores/maria.png")).unwrap();
    messages::insert_mensaje(conn, v1.id, 1, Some("p1"), "a", false).unwrap();
    messages::insert_mensaje(conn, v1.id, 2, None, "b", true).unwrap();
    messages::insert_mensaje(conn, v2.id, 1, Some("p1"), "c", false).unwrap();

    assert_eq!(messages::list_mensajes(conn, None, None).unwrap().len(), 3);
    assert_eq!(messages::list_mensajes(conn, Some(v1.id), None).unwrap().len(), 2);
    assert_eq!(messages::list_mensajes(conn, None, Some("p1")).unwrap().len(), 2);
    assert_eq!(messages::list_mensajes(conn, Some(v1.id), Some("p1")).unwrap().len(), 1);
}

#[test]
fn file_backed_store_persists_across_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("vendigo.db");
    {
        let store = Store::open(&path).unwrap();
        accounts::insert_user(store.conn(), "ana", "ana@x.com", "h", "", "").unwrap();
    }
    let store = Store::open(&path).unwrap();
    let users = accounts::list_users(store.conn()).unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "ana");
}

#[test]
fn shared_store_with_runs_under_one_lock() {
    let shared = SharedStore::in_memory().unwrap();
    let id = shared
        .with(|conn| {
            let u = accounts::insert_user(conn, "ana", "ana@x.com", "h", "", "")?;
            profiles::get_or_create_profile(conn, u.id)?;
            Ok(u.id)
        })
        .unwrap();
    let phone = shared
        .with(|conn| Ok(profiles::get_or_create_profile(conn, id)?.phone))
        .unwrap();
    assert!(phone.is_none());
}
