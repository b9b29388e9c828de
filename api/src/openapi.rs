// OpenAPI schema generator
// Hand-maintained document for the storefront endpoints

use serde_json::{json, Value};

fn error_ref(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_ref(description: &str, schema: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema) }
            }
        }
    })
}

fn dialog_id_param() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "description": "Purchase dialog id",
        "schema": { "type": "string", "format": "uuid" }
    })
}

pub fn generate_openapi_spec() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "IoT Data Marketplace API",
            "description": "Browse IoT data sets, pay with an Ethereum wallet and review purchases",
            "version": env!("CARGO_PKG_VERSION")
        },
        "servers": [
            {
                "url": "http://localhost:8080",
                "description": "Development server"
            }
        ],
        "paths": {
            "/api/auth/register": {
                "post": {
                    "summary": "Register",
                    "description": "Create an account; the client is sent to the email verification page",
                    "tags": ["auth"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/RegisterRequest" }
                            }
                        }
                    },
                    "responses": {
                        "200": json_ref("Account created", "AuthResponse"),
                        "400": error_ref("Missing fields or passwords do not match"),
                        "401": error_ref("Rejected by the auth service"),
                        "502": error_ref("Auth service unreachable")
                    }
                }
            },
            "/api/auth/login": {
                "post": {
                    "summary": "Log in",
                    "description": "Exchange email and password for a session; sets the session cookie",
                    "tags": ["auth"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/LoginRequest" }
                            }
                        }
                    },
                    "responses": {
                        "200": json_ref("Signed in, redirect to the dashboard", "AuthResponse"),
                        "400": error_ref("Missing fields"),
                        "401": error_ref("Invalid credentials")
                    }
                }
            },
            "/api/auth/logout": {
                "post": {
                    "summary": "Log out",
                    "tags": ["auth"],
                    "responses": {
                        "200": json_ref("Session cleared", "AuthResponse")
                    }
                }
            },
            "/api/auth/refresh": {
                "post": {
                    "summary": "Refresh session",
                    "tags": ["auth"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": { "refresh_token": { "type": "string" } }
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": json_ref("New tokens", "AuthResponse"),
                        "400": error_ref("Missing refresh token"),
                        "401": error_ref("Refresh token rejected")
                    }
                }
            },
            "/api/auth/session": {
                "get": {
                    "summary": "Current session",
                    "tags": ["auth"],
                    "responses": {
                        "200": {
                            "description": "Authenticated flag and user, if any"
                        }
                    }
                }
            },
            "/api/auth/verify": {
                "get": {
                    "summary": "Verify email",
                    "tags": ["auth"],
                    "parameters": [
                        { "name": "email", "in": "query", "schema": { "type": "string" } },
                        { "name": "token", "in": "query", "schema": { "type": "string" } }
                    ],
                    "responses": {
                        "200": json_ref("Email verified", "AuthResponse"),
                        "400": error_ref("Invalid verification link")
                    }
                }
            },
            "/api/listings": {
                "get": {
                    "summary": "Search listings",
                    "description": "Case-insensitive search over title and description, with an optional category",
                    "tags": ["listings"],
                    "parameters": [
                        {
                            "name": "q",
                            "in": "query",
                            "description": "Search text",
                            "schema": { "type": "string" }
                        },
                        {
                            "name": "category",
                            "in": "query",
                            "description": "Category name, or `all`",
                            "schema": { "type": "string", "default": "all" }
                        }
                    ],
                    "responses": {
                        "200": {
                            "description": "Matching listings in catalog order",
                            "headers": {
                                "ETag": {
                                    "description": "Entity tag for caching",
                                    "schema": { "type": "string" }
                                }
                            },
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ListingListResponse" }
                                }
                            }
                        },
                        "304": {
                            "description": "Not Modified (ETag matched)"
                        }
                    }
                },
                "post": {
                    "summary": "Sell data",
                    "description": "Publish a new listing owned by the current user",
                    "tags": ["listings"],
                    "security": [{ "session": [] }],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/SellRequest" }
                            }
                        }
                    },
                    "responses": {
                        "201": {
                            "description": "Listing created"
                        },
                        "400": error_ref("Missing fields or invalid price"),
                        "401": error_ref("Login required"),
                        "503": error_ref("Database not available")
                    }
                }
            },
            "/api/listings/categories": {
                "get": {
                    "summary": "List categories",
                    "tags": ["listings"],
                    "responses": {
                        "200": { "description": "Distinct categories in catalog order" }
                    }
                }
            },
            "/api/listings/mine": {
                "get": {
                    "summary": "Listings published by the current user",
                    "tags": ["listings"],
                    "security": [{ "session": [] }],
                    "responses": {
                        "200": { "description": "Listings, newest first" },
                        "401": error_ref("Login required"),
                        "503": error_ref("Database not available")
                    }
                }
            },
            "/api/listings/{id}": {
                "get": {
                    "summary": "Listing detail",
                    "tags": ["listings"],
                    "parameters": [
                        {
                            "name": "id",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "integer", "format": "int64" }
                        }
                    ],
                    "responses": {
                        "200": { "description": "Listing with an `already_purchased` flag" },
                        "404": error_ref("Listing not found")
                    }
                }
            },
            "/api/purchases": {
                "post": {
                    "summary": "Open purchase dialog",
                    "tags": ["purchases"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": { "listing_id": { "type": "integer", "format": "int64" } }
                                }
                            }
                        }
                    },
                    "responses": {
                        "201": json_ref("Dialog opened in the idle state", "PurchaseDialog"),
                        "404": error_ref("Listing not found")
                    }
                }
            },
            "/api/purchases/{id}": {
                "get": {
                    "summary": "Purchase dialog state",
                    "tags": ["purchases"],
                    "parameters": [dialog_id_param()],
                    "responses": {
                        "200": json_ref("Dialog", "PurchaseDialog"),
                        "404": error_ref("Dialog not found")
                    }
                },
                "delete": {
                    "summary": "Close purchase dialog",
                    "tags": ["purchases"],
                    "parameters": [dialog_id_param()],
                    "responses": {
                        "204": { "description": "Dialog closed" },
                        "404": error_ref("Dialog not found"),
                        "409": error_ref("A wallet call is pending")
                    }
                }
            },
            "/api/purchases/{id}/wallet": {
                "post": {
                    "summary": "Connect wallet",
                    "tags": ["purchases"],
                    "security": [{ "session": [] }],
                    "parameters": [dialog_id_param()],
                    "responses": {
                        "200": json_ref("Wallet connected or error state", "PurchaseDialog"),
                        "401": error_ref("Login required"),
                        "409": error_ref("Dialog is not idle")
                    }
                }
            },
            "/api/purchases/{id}/payment": {
                "post": {
                    "summary": "Pay with the connected wallet",
                    "tags": ["purchases"],
                    "security": [{ "session": [] }],
                    "parameters": [dialog_id_param()],
                    "responses": {
                        "200": json_ref("Confirmed or error state", "PurchaseDialog"),
                        "400": error_ref("Listing price cannot be converted"),
                        "401": error_ref("Login required"),
                        "409": error_ref("Wallet not connected")
                    }
                }
            },
            "/api/purchases/{id}/reset": {
                "post": {
                    "summary": "Return the dialog to idle",
                    "tags": ["purchases"],
                    "parameters": [dialog_id_param()],
                    "responses": {
                        "200": json_ref("Dialog", "PurchaseDialog"),
                        "409": error_ref("Payment in flight")
                    }
                }
            },
            "/api/transactions": {
                "get": {
                    "summary": "Purchase history",
                    "description": "Transactions of the current user, newest first",
                    "tags": ["transactions"],
                    "security": [{ "session": [] }],
                    "responses": {
                        "200": json_ref("History", "TransactionListResponse"),
                        "401": error_ref("Login required"),
                        "503": error_ref("Failed to load transactions")
                    }
                }
            },
            "/api/dashboard": {
                "get": {
                    "summary": "Dashboard summary",
                    "tags": ["dashboard"],
                    "security": [{ "session": [] }],
                    "responses": {
                        "200": { "description": "Email, purchase count, recent transactions and listing count" },
                        "401": error_ref("Login required")
                    }
                }
            },
            "/api/pages/resolve": {
                "get": {
                    "summary": "Resolve a client route",
                    "tags": ["navigation"],
                    "parameters": [
                        { "name": "path", "in": "query", "schema": { "type": "string" } }
                    ],
                    "responses": {
                        "200": { "description": "Page to render, or a redirect for gated pages" }
                    }
                }
            },
            "/healthz": {
                "get": {
                    "summary": "Health check",
                    "description": "Simple liveness probe",
                    "tags": ["health"],
                    "responses": {
                        "200": {
                            "description": "Service is alive"
                        }
                    }
                }
            },
            "/readyz": {
                "get": {
                    "summary": "Readiness check",
                    "description": "Checks if service and integrations are ready",
                    "tags": ["health"],
                    "responses": {
                        "200": {
                            "description": "Service is ready"
                        },
                        "503": {
                            "description": "Service or integrations are not ready"
                        }
                    }
                }
            }
        },
        "components": {
            "securitySchemes": {
                "session": {
                    "type": "http",
                    "scheme": "bearer",
                    "description": "Access token, or the session cookie"
                }
            },
            "schemas": {
                "LoginRequest": {
                    "type": "object",
                    "properties": {
                        "email": { "type": "string" },
                        "password": { "type": "string" }
                    }
                },
                "RegisterRequest": {
                    "type": "object",
                    "properties": {
                        "email": { "type": "string" },
                        "password": { "type": "string" },
                        "confirm_password": { "type": "string" }
                    }
                },
                "AuthResponse": {
                    "type": "object",
                    "properties": {
                        "redirect": { "type": "string" },
                        "access_token": { "type": "string", "nullable": true },
                        "refresh_token": { "type": "string", "nullable": true },
                        "expires_in": { "type": "integer", "nullable": true },
                        "user": { "type": "object", "nullable": true }
                    }
                },
                "Listing": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "full_description": { "type": "string" },
                        "category": { "type": "string" },
                        "price": { "type": "string", "description": "Display price, e.g. $24.99 or $49.99/month" },
                        "provider": { "type": "string" },
                        "rating": { "type": "number" },
                        "updated_at": { "type": "string" },
                        "data_points": { "type": "string" },
                        "frequency": { "type": "string" },
                        "format": { "type": "string" }
                    }
                },
                "ListingListResponse": {
                    "type": "object",
                    "properties": {
                        "items": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Listing" }
                        },
                        "total": { "type": "integer" }
                    }
                },
                "SellRequest": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "category": { "type": "string" },
                        "price": { "type": "string" },
                        "is_subscription": { "type": "boolean" },
                        "sample_included": { "type": "boolean" },
                        "data_format": { "type": "string" },
                        "update_frequency": { "type": "string", "nullable": true },
                        "tags": { "type": "array", "items": { "type": "string" } }
                    }
                },
                "PurchaseDialog": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "item": { "type": "object" },
                        "state": {
                            "type": "object",
                            "properties": {
                                "status": {
                                    "type": "string",
                                    "enum": [
                                        "idle",
                                        "connecting_wallet",
                                        "wallet_connected",
                                        "paying",
                                        "confirmed",
                                        "error"
                                    ]
                                },
                                "address": { "type": "string", "nullable": true },
                                "eth_amount": { "type": "string", "nullable": true },
                                "tx_hash": { "type": "string", "nullable": true },
                                "message": { "type": "string", "nullable": true }
                            }
                        },
                        "created_at": { "type": "string", "format": "date-time" }
                    }
                },
                "Transaction": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "user_id": { "type": "string", "format": "uuid" },
                        "data_id": { "type": "integer", "format": "int64" },
                        "data_title": { "type": "string" },
                        "price": { "type": "string" },
                        "eth_price": { "type": "string", "nullable": true },
                        "provider": { "type": "string" },
                        "date": { "type": "string", "format": "date-time" },
                        "status": { "type": "string" },
                        "tx_hash": { "type": "string", "nullable": true }
                    }
                },
                "TransactionListResponse": {
                    "type": "object",
                    "properties": {
                        "items": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Transaction" }
                        },
                        "total": { "type": "integer" }
                    }
                },
                "ErrorResponse": {
                    "type": "object",
                    "properties": {
                        "error": { "type": "string" },
                        "details": { "type": "string", "nullable": true },
                        "missing": {
                            "type": "array",
                            "items": { "type": "string" },
                            "nullable": true
                        },
                        "redirect": { "type": "string", "nullable": true }
                    }
                }
            }
        }
    })
}
