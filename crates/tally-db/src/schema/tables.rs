//! The application schema.

use crate::define_table;

define_table!(
    users => Users {
        table: "users",
        model: "users",
        columns: {
            ID: "id" => Text.primary_key().default(DefaultRule::Uuid),
            NAME: "name" => Text.not_null(),
            EMAIL: "email" => Text.not_null().unique(),
            ROLE: "role" => Text.default(DefaultRule::Text("USER")),
            CREATED_AT: "createdAt" => Timestamp.default(DefaultRule::UnixEpoch),
            UPDATED_AT: "updatedAt" => Timestamp.default(DefaultRule::UnixEpoch),
        },
        relations: {
            PRINTERS: "printers" => {
                local: "id",
                target: super::printers::Printers,
                referenced: "userId",
            },
            TEMPLATES: "templates" => {
                local: "id",
                target: super::invoice_templates::InvoiceTemplates,
                referenced: "userId",
            },
        }
    }
);

define_table!(
    printers => Printers {
        table: "printers",
        model: "printers",
        columns: {
            ID: "id" => Text.primary_key().default(DefaultRule::Uuid),
            NAME: "name" => Text.not_null(),
            IS_DEFAULT: "isDefault" => Boolean.default(DefaultRule::Boolean(false)),
            USER_ID: "userId" => Text.not_null(),
        },
        relations: {
            OWNER: "owner" => {
                local: "userId",
                target: super::users::Users,
                referenced: "id",
            },
        }
    }
);

define_table!(
    invoice_templates => InvoiceTemplates {
        table: "invoice_templates",
        model: "invoiceTemplates",
        columns: {
            ID: "id" => Text.primary_key().default(DefaultRule::Uuid),
            NAME: "name" => Text.not_null(),
            CONTENT: "content" => Text.not_null(),
            USER_ID: "userId" => Text,
            CREATED_AT: "createdAt" => Timestamp.default(DefaultRule::UnixEpoch),
        },
        relations: {
            AUTHOR: "author" => {
                local: "userId",
                target: super::users::Users,
                referenced: "id",
            },
        }
    }
);
