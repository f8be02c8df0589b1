//! Embedded DDL, applied on every open. All statements are idempotent.
//!
//! Relational shape worth calling out:
//! - `auth_user.email` carries no UNIQUE index; duplicate-email rejection is a
//!   registration-time application check only.
//! - `detalle.producto_id` deliberately has no foreign key: deleting a product
//!   leaves its order lines in place with a dangling reference.
//! - `producto.category_id` references `categoria` with no cascade, so a
//!   category delete fails while products still point at it.

pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS auth_user (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    first_name    TEXT NOT NULL DEFAULT '',
    last_name     TEXT NOT NULL DEFAULT '',
    date_joined   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS auth_token (
    key     TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL UNIQUE REFERENCES auth_user(id) ON DELETE CASCADE,
    created TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_profile (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL UNIQUE REFERENCES auth_user(id) ON DELETE CASCADE,
    phone         TEXT,
    address       TEXT,
    member_since  TEXT,
    rating        TEXT DEFAULT '0.00',
    products_sold INTEGER DEFAULT 0
);

CREATE TABLE IF NOT EXISTS categoria (
    category_id   TEXT PRIMARY KEY,
    category_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS producto (
    product_id   TEXT PRIMARY KEY,
    image        TEXT,
    category_id  TEXT REFERENCES categoria(category_id),
    id_user      INTEGER,
    product_name TEXT NOT NULL,
    description  TEXT,
    state        INTEGER NOT NULL,
    price        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_producto_category ON producto(category_id);

CREATE TABLE IF NOT EXISTS imagen_producto (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    producto_id TEXT NOT NULL REFERENCES producto(product_id) ON DELETE CASCADE,
    imagen      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_imagen_producto_producto ON imagen_producto(producto_id);

CREATE TABLE IF NOT EXISTS pedido (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    fecha_pedido TEXT NOT NULL,
    monto_total  TEXT NOT NULL,
    estado       TEXT NOT NULL DEFAULT 'Pendiente',
    comentario   TEXT
);

CREATE TABLE IF NOT EXISTS detalle (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    pedido_id     INTEGER NOT NULL REFERENCES pedido(id) ON DELETE CASCADE,
    producto_id   TEXT NOT NULL,
    cantidad      INTEGER NOT NULL,
    precio_unidad TEXT NOT NULL,
    UNIQUE (pedido_id, producto_id)
);

CREATE INDEX IF NOT EXISTS idx_detalle_pedido ON detalle(pedido_id);

CREATE TABLE IF NOT EXISTS vendedor (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL,
    foto   TEXT
);

CREATE TABLE IF NOT EXISTS mensaje (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    vendedor_id INTEGER NOT NULL REFERENCES vendedor(id) ON DELETE CASCADE,
    cliente_id  INTEGER NOT NULL,
    producto_id TEXT REFERENCES producto(product_id) ON DELETE SET NULL,
    texto       TEXT NOT NULL,
    fecha       TEXT NOT NULL,
    es_vendedor INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_mensaje_vendedor ON mensaje(vendedor_id);
CREATE INDEX IF NOT EXISTS idx_mensaje_producto ON mensaje(producto_id);
";
