// src/db/scope.rs

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::Role,
    models::book::Book,
    models::list::List,
    models::user::User,
};

// ---
// O filtro de visibilidade derivado da sessão. Toda listagem e leitura de
// catálogo (livros e listas) passa por aqui, de modo que o escopo de tenant
// e papel é aplicado implicitamente, nunca rota a rota.
// ---
// A regra por papel:
//   admin        -> tudo (ou uma empresa explícita, via parâmetro)
//   companyAdmin -> tudo da sua empresa
//   storeAdmin   -> tudo da sua loja
//   librarian    -> apenas o que está ATRIBUÍDO a ele (assigned_to),
//                   mesmo que ele seja o autor do registro.
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogScope {
    All,
    Company(Uuid),
    Store(Uuid),
    Assigned(Uuid),
}

impl CatalogScope {
    /// Deriva o escopo de leitura a partir do usuário da sessão.
    /// `explicit_company` só é honrado para o admin da plataforma.
    pub fn for_user(user: &User, explicit_company: Option<Uuid>) -> Result<Self, AppError> {
        match user.role {
            Role::Admin => Ok(explicit_company
                .map(CatalogScope::Company)
                .unwrap_or(CatalogScope::All)),
            Role::CompanyAdmin => user
                .company_id
                .map(CatalogScope::Company)
                .ok_or(AppError::Forbidden("Usuário sem empresa vinculada.")),
            Role::StoreAdmin => user
                .store_id
                .map(CatalogScope::Store)
                .ok_or(AppError::Forbidden("Usuário sem loja vinculada.")),
            Role::Librarian => Ok(CatalogScope::Assigned(user.id)),
        }
    }

    /// Acrescenta a cláusula do escopo a uma consulta em construção.
    /// A consulta base já deve conter um WHERE.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            CatalogScope::All => {}
            CatalogScope::Company(company_id) => {
                qb.push(" AND company_id = ").push_bind(*company_id);
            }
            CatalogScope::Store(store_id) => {
                qb.push(" AND store_id = ").push_bind(*store_id);
            }
            CatalogScope::Assigned(user_id) => {
                qb.push(" AND assigned_to @> ").push_bind(vec![*user_id]);
            }
        }
    }

    /// Versão pontual do filtro, para leituras por id. O resultado negativo
    /// vira 404 na borda: "não existe" e "não é seu" são indistinguíveis.
    pub fn allows_book(&self, book: &Book) -> bool {
        match self {
            CatalogScope::All => true,
            CatalogScope::Company(company_id) => book.company_id == *company_id,
            CatalogScope::Store(store_id) => book.store_id == Some(*store_id),
            CatalogScope::Assigned(user_id) => book.assigned_to.contains(user_id),
        }
    }

    pub fn allows_list(&self, list: &List) -> bool {
        match self {
            CatalogScope::All => true,
            CatalogScope::Company(company_id) => list.company_id == *company_id,
            CatalogScope::Store(store_id) => list.store_id == Some(*store_id),
            CatalogScope::Assigned(user_id) => list.assigned_to.contains(user_id),
        }
    }
}

/// Filtro secundário: exclui conteúdo cujo autor foi soft-deletado.
/// O conjunto de autores deletados é materializado ANTES da consulta
/// (duas etapas, sem join); autores apenas inativos/suspensos continuam
/// visíveis: política distinta da deleção, de propósito.
pub fn push_author_exclusion(qb: &mut QueryBuilder<'_, Postgres>, deleted_ids: &[Uuid]) {
    if deleted_ids.is_empty() {
        return;
    }
    qb.push(" AND NOT (created_by = ANY(")
        .push_bind(deleted_ids.to_vec())
        .push("))");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    use crate::models::user::UserStatus;

    fn user(role: Role, company: Option<Uuid>, store: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            company_id: company,
            store_id: store,
            role,
            status: UserStatus::Active,
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            email: "ana@acme.com".into(),
            password_hash: "x".into(),
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            last_login_ip: None,
            sections: vec![],
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn book_for(company: Uuid, store: Option<Uuid>, assigned: Vec<Uuid>) -> Book {
        Book {
            id: Uuid::new_v4(),
            company_id: company,
            store_id: store,
            isbn: "9780134685991".into(),
            book_data: Json(Default::default()),
            genre: None,
            tone: None,
            age_group: None,
            purchase_link: None,
            recommendation: None,
            owner_user_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            updated_by: None,
            assigned_to: assigned,
            sections: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_ve_tudo_ou_empresa_explicita() {
        let admin = user(Role::Admin, None, None);
        assert_eq!(
            CatalogScope::for_user(&admin, None).unwrap(),
            CatalogScope::All
        );

        let company = Uuid::new_v4();
        assert_eq!(
            CatalogScope::for_user(&admin, Some(company)).unwrap(),
            CatalogScope::Company(company)
        );
    }

    #[test]
    fn company_admin_preso_a_sua_empresa() {
        let company = Uuid::new_v4();
        let other = Uuid::new_v4();
        let ca = user(Role::CompanyAdmin, Some(company), None);

        // O parâmetro explícito é ignorado para quem não é admin.
        assert_eq!(
            CatalogScope::for_user(&ca, Some(other)).unwrap(),
            CatalogScope::Company(company)
        );
    }

    #[test]
    fn store_admin_preso_a_sua_loja() {
        let company = Uuid::new_v4();
        let store = Uuid::new_v4();
        let sa = user(Role::StoreAdmin, Some(company), Some(store));
        assert_eq!(
            CatalogScope::for_user(&sa, None).unwrap(),
            CatalogScope::Store(store)
        );

        let sem_loja = user(Role::StoreAdmin, Some(company), None);
        assert!(CatalogScope::for_user(&sem_loja, None).is_err());
    }

    #[test]
    fn librarian_ve_apenas_o_atribuido() {
        let company = Uuid::new_v4();
        let store = Uuid::new_v4();
        let lib = user(Role::Librarian, Some(company), Some(store));
        let scope = CatalogScope::for_user(&lib, None).unwrap();
        assert_eq!(scope, CatalogScope::Assigned(lib.id));

        // Mesmo sendo autor, sem atribuição o livro fica invisível.
        let mut proprio = book_for(company, Some(store), vec![]);
        proprio.created_by = lib.id;
        proprio.owner_user_id = lib.id;
        assert!(!scope.allows_book(&proprio));

        let atribuido = book_for(company, Some(store), vec![lib.id]);
        assert!(scope.allows_book(&atribuido));
    }

    #[test]
    fn clausulas_sql_por_escopo() {
        let company = Uuid::new_v4();

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM books WHERE 1=1");
        CatalogScope::All.push_sql(&mut qb);
        assert_eq!(qb.into_sql(), "SELECT * FROM books WHERE 1=1");

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM books WHERE 1=1");
        CatalogScope::Company(company).push_sql(&mut qb);
        assert_eq!(
            qb.into_sql(),
            "SELECT * FROM books WHERE 1=1 AND company_id = $1"
        );

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM books WHERE 1=1");
        CatalogScope::Assigned(Uuid::new_v4()).push_sql(&mut qb);
        assert_eq!(
            qb.into_sql(),
            "SELECT * FROM books WHERE 1=1 AND assigned_to @> $1"
        );
    }

    #[test]
    fn exclusao_de_autores_deletados() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM lists WHERE 1=1");
        push_author_exclusion(&mut qb, &[]);
        assert_eq!(qb.into_sql(), "SELECT * FROM lists WHERE 1=1");

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM lists WHERE 1=1");
        push_author_exclusion(&mut qb, &[Uuid::new_v4()]);
        assert_eq!(
            qb.into_sql(),
            "SELECT * FROM lists WHERE 1=1 AND NOT (created_by = ANY($1))"
        );
    }
}
