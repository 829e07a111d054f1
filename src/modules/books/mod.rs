pub mod models;
pub mod routes;
pub mod service;
pub mod store;
pub mod validation;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_kernel::{InitCtx, Migration, Module};

use service::BookService;
use store::BookStore;

pub const MODULE_NAME: &str = "books";

/// The library catalog: one `Book` resource with full CRUD
pub struct BooksModule {
    service: BookService,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self {
            service: BookService::new(store),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.database.seed_on_empty {
            self.service
                .seed()
                .context("failed to seed the book catalog")?;
        }

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        });
        let book_body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookInput" }
                }
            }
        });
        let book_content = json!({
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        });
        let not_found = json!({
            "description": "Book not found",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/MessageResponse" }
                }
            }
        });
        let invalid = json!({
            "description": "Validation failed, one message per invalid field",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ValidationErrors" }
                }
            }
        });
        let internal = json!({
            "description": "Internal server error",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/InternalErrorResponse" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "All books in insertion order",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "500": internal
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": book_body,
                        "responses": {
                            "201": { "description": "Book created", "content": book_content },
                            "400": invalid,
                            "500": internal
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": {
                            "200": { "description": "The book", "content": book_content },
                            "404": not_found,
                            "500": internal
                        }
                    },
                    "put": {
                        "summary": "Replace a book's title, author and description",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "requestBody": book_body,
                        "responses": {
                            "200": { "description": "Book updated", "content": book_content },
                            "400": invalid,
                            "404": not_found,
                            "500": internal
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": {
                            "200": {
                                "description": "Book deleted",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/DeleteConfirmation" }
                                    }
                                }
                            },
                            "404": not_found,
                            "500": internal
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string", "maxLength": 200 },
                            "author": { "type": "string", "maxLength": 100 },
                            "description": { "type": "string", "maxLength": 1000 },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "title", "author", "createdAt"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "minLength": 1, "maxLength": 200 },
                            "author": { "type": "string", "minLength": 1, "maxLength": 100 },
                            "description": { "type": "string", "maxLength": 1000 }
                        },
                        "required": ["title", "author"]
                    },
                    "DeleteConfirmation": {
                        "type": "object",
                        "properties": {
                            "message": { "type": "string" },
                            "id": { "type": "integer", "format": "int64" }
                        },
                        "required": ["message", "id"]
                    },
                    "ValidationErrors": {
                        "type": "object",
                        "additionalProperties": { "type": "string" }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        store::MIGRATIONS.to_vec()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<dyn BookStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
