// src/services/dedup_service.rs
//
// Detecção e unificação de contatos duplicados.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        normalize::{
            canonical_phone, digits_only, format_phone_display, normalize_cnpj, normalize_cpf,
            normalize_name,
        },
    },
    db::{ContactStore, ContactTx},
    models::{
        contact::{ContactFields, ContactRecord, NewEmail, NewPhone},
        dedup::{
            BatchMergeReport, DuplicateGroup, FieldResolution, MatchType, MergeField, MergePlan,
            MergeResult, RelinkTarget,
        },
    },
};

// =========================================================================
//  AGRUPAMENTO (puro, sem banco)
// =========================================================================

fn format_cpf(digits: &str) -> String {
    format!("{}.{}.{}-{}", &digits[..3], &digits[3..6], &digits[6..9], &digits[9..])
}

fn format_cnpj(digits: &str) -> String {
    format!(
        "{}.{}.{}/{}-{}",
        &digits[..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..]
    )
}

/// Chaves (normalizada, exibição) de um contato para um tipo de colisão.
fn keys_for(record: &ContactRecord, match_type: MatchType) -> Vec<(String, String)> {
    let fields = &record.contact.fields;
    let name_key = |value: &Option<String>| {
        value
            .as_deref()
            .and_then(|raw| normalize_name(raw).map(|key| (key, raw.trim().to_string())))
            .into_iter()
            .collect::<Vec<_>>()
    };

    match match_type {
        MatchType::Cpf => fields
            .cpf
            .as_deref()
            .and_then(normalize_cpf)
            .map(|key| {
                let display = format_cpf(&key);
                (key, display)
            })
            .into_iter()
            .collect(),
        MatchType::Cnpj => fields
            .cnpj
            .as_deref()
            .and_then(normalize_cnpj)
            .map(|key| {
                let display = format_cnpj(&key);
                (key, display)
            })
            .into_iter()
            .collect(),
        MatchType::Phone => {
            let numbers: BTreeSet<String> = record
                .phones
                .iter()
                .map(|p| digits_only(&p.number))
                .filter(|n| !n.is_empty())
                .collect();
            numbers
                .into_iter()
                .map(|key| {
                    let display = format_phone_display(&key);
                    (key, display)
                })
                .collect()
        }
        MatchType::Name => name_key(&fields.full_name),
        MatchType::LegalName => name_key(&fields.legal_name),
        MatchType::TradeName => name_key(&fields.trade_name),
    }
}

/// Particiona os contatos por cada chave, independentemente, e devolve os grupos
/// com dois ou mais membros. Um contato pode aparecer em vários grupos.
pub fn find_duplicate_groups(records: &[ContactRecord]) -> Vec<DuplicateGroup> {
    let mut ordered: Vec<&ContactRecord> = records.iter().collect();
    ordered.sort_by_key(|r| (r.contact.created_at, r.contact.id));

    let mut groups = Vec::new();
    for match_type in MatchType::ALL {
        // chave -> (exibição, membros)
        let mut buckets: BTreeMap<String, (String, Vec<&ContactRecord>)> = BTreeMap::new();
        for record in &ordered {
            for (key, display) in keys_for(record, match_type) {
                let bucket = buckets.entry(key).or_insert_with(|| (display, Vec::new()));
                if !bucket.1.iter().any(|m| m.id() == record.id()) {
                    bucket.1.push(record);
                }
            }
        }

        groups.extend(
            buckets
                .into_iter()
                .filter(|(_, (_, members))| members.len() >= 2)
                .map(|(key, (key_display, members))| DuplicateGroup {
                    match_type,
                    key,
                    key_display,
                    members: members.into_iter().cloned().collect(),
                }),
        );
    }
    groups
}

// =========================================================================
//  RESOLUÇÃO
// =========================================================================

fn field_name(field: MergeField) -> String {
    serde_json::to_value(field)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", field))
}

/// Escolhe o sobrevivente e exatamente um valor por campo. `members` vem do mais antigo para o mais novo.
pub fn resolve_fields(
    members: &[ContactRecord],
    resolution: &FieldResolution,
) -> Result<(Uuid, ContactFields), AppError> {
    let oldest = members.first().ok_or(AppError::MergeGroupTooSmall)?;

    match resolution {
        FieldResolution::Manual { survivor_id, field_sources } => {
            let survivor = members
                .iter()
                .find(|m| m.id() == *survivor_id)
                .ok_or(AppError::SurvivorNotInGroup(*survivor_id))?;

            let mut fields = survivor.contact.fields.clone();
            for (field, source_id) in field_sources {
                let source = members.iter().find(|m| m.id() == *source_id).ok_or_else(|| {
                    AppError::InvalidMergeField {
                        field: field_name(*field),
                        source_id: *source_id,
                    }
                })?;
                fields.copy_field(*field, &source.contact.fields);
            }
            Ok((*survivor_id, fields))
        }
        FieldResolution::OldestWins => {
            let mut fields = oldest.contact.fields.clone();
            for field in MergeField::ALL {
                if !fields.is_blank(field) {
                    continue;
                }
                // Campo vazio no mais antigo: vale o próximo mais antigo que tiver valor
                if let Some(donor) = members[1..]
                    .iter()
                    .find(|m| !m.contact.fields.is_blank(field))
                {
                    fields.copy_field(field, &donor.contact.fields);
                }
            }
            Ok((oldest.id(), fields))
        }
    }
}

/// O que falta gravar no sobrevivente para que ele tenha a união dos telefones e e-mails.
#[derive(Debug, Default)]
pub struct ChildUnion {
    pub add_phones: Vec<NewPhone>,
    pub add_emails: Vec<NewEmail>,
    /// Canais do próprio sobrevivente que o operador excluiu.
    pub drop_phones: Vec<String>,
    pub drop_emails: Vec<String>,
}

/// Telefones excluídos podem vir como o operador os vê ("(33) 98888-1111") ou já
/// na chave gravada; as duas formas entram no conjunto.
pub fn union_children(
    survivor_id: Uuid,
    members: &[ContactRecord],
    excluded_phones: &[String],
    excluded_emails: &[String],
    default_country_code: &str,
) -> ChildUnion {
    let excluded_phones: HashSet<String> = excluded_phones
        .iter()
        .flat_map(|raw| [Some(digits_only(raw)), canonical_phone(raw, default_country_code)])
        .flatten()
        .filter(|key| !key.is_empty())
        .collect();
    let excluded_emails: HashSet<String> =
        excluded_emails.iter().map(|e| e.trim().to_lowercase()).collect();

    let mut union = ChildUnion::default();
    let mut phones: HashSet<String> = HashSet::new();
    let mut emails: HashSet<String> = HashSet::new();

    if let Some(survivor) = members.iter().find(|m| m.id() == survivor_id) {
        for phone in &survivor.phones {
            if excluded_phones.contains(&phone.number) {
                union.drop_phones.push(phone.number.clone());
            } else {
                phones.insert(phone.number.clone());
            }
        }
        for email in &survivor.emails {
            let address = email.address.to_lowercase();
            if excluded_emails.contains(&address) {
                union.drop_emails.push(email.address.clone());
            } else {
                emails.insert(address);
            }
        }
    }

    for member in members.iter().filter(|m| m.id() != survivor_id) {
        for phone in &member.phones {
            if !excluded_phones.contains(&phone.number) && phones.insert(phone.number.clone()) {
                union.add_phones.push(NewPhone {
                    number: phone.number.clone(),
                    country_code: phone.country_code.clone(),
                    kind: phone.kind.clone(),
                });
            }
        }
        for email in &member.emails {
            let address = email.address.to_lowercase();
            if !excluded_emails.contains(&address) && emails.insert(address.clone()) {
                union.add_emails.push(NewEmail { address, kind: email.kind.clone() });
            }
        }
    }

    union
}

// =========================================================================
//  SERVIÇO
// =========================================================================

#[derive(Clone)]
pub struct DedupService<S: ContactStore> {
    store: S,
    default_country_code: String,
}

impl<S: ContactStore> DedupService<S> {
    pub fn new(store: S, default_country_code: impl Into<String>) -> Self {
        Self {
            store,
            default_country_code: default_country_code.into(),
        }
    }

    pub async fn list_groups(&self, organization_id: Uuid) -> Result<Vec<DuplicateGroup>, AppError> {
        let mut tx = self.store.begin(organization_id).await?;
        let records = tx.list_contact_records().await?;
        tx.commit().await?;

        Ok(find_duplicate_groups(&records))
    }

    /// Um grupo específico, recalculado com os dados atuais.
    pub async fn find_group(
        &self,
        organization_id: Uuid,
        match_type: MatchType,
        key: &str,
    ) -> Result<DuplicateGroup, AppError> {
        self.list_groups(organization_id)
            .await?
            .into_iter()
            .find(|g| g.match_type == match_type && g.key == key)
            .ok_or(AppError::DuplicateGroupNotFound)
    }

    /// Unificação revisada pelo operador. Tudo ou nada.
    pub async fn merge(&self, organization_id: Uuid, plan: MergePlan) -> Result<MergeResult, AppError> {
        let mut seen = HashSet::new();
        let member_ids: Vec<Uuid> = plan
            .member_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        if member_ids.len() < 2 {
            return Err(AppError::MergeGroupTooSmall);
        }

        let mut tx = self.store.begin(organization_id).await?;
        let result = async {
            let members = tx.lock_contact_records(&member_ids).await?;
            // Id de outra organização não volta do banco: a requisição inteira falha
            if let Some(missing) = member_ids.iter().find(|id| !members.iter().any(|m| m.id() == **id)) {
                return Err(AppError::ContactNotFound(*missing));
            }
            Self::commit_group(&mut tx, members, &plan, &self.default_country_code).await
        }
        .await;

        self.finish(tx, result, &format!("manual:{}", member_ids.len())).await
    }

    /// Passe automático: o mais antigo vence, campos vazios são completados pelos
    /// demais, telefones e e-mails são unidos. Para no primeiro grupo que falhar;
    /// os grupos anteriores continuam unificados.
    pub async fn merge_all(&self, organization_id: Uuid) -> Result<BatchMergeReport, AppError> {
        let groups = self.list_groups(organization_id).await?;
        let mut report = BatchMergeReport {
            groups_found: groups.len(),
            ..Default::default()
        };

        for group in groups {
            let label = group.label();
            match self.merge_live_group(organization_id, &group).await {
                Ok(Some(result)) => {
                    report.groups_merged += 1;
                    report.contacts_removed += result.contacts_removed;
                    report.merges.push(result);
                }
                Ok(None) => {
                    tracing::debug!("Grupo {} deixou de existir, pulando", label);
                    report.groups_skipped += 1;
                }
                Err(e) => {
                    return Err(AppError::BatchMergeFailed {
                        group: label,
                        merged_before: report.groups_merged,
                        source: Box::new(e),
                    });
                }
            }
        }

        tracing::info!(
            "Unificação automática: {} grupo(s), {} unificado(s), {} contato(s) removido(s)",
            report.groups_found,
            report.groups_merged,
            report.contacts_removed
        );
        Ok(report)
    }

    // Recalcula o grupo sobre todos os contatos atuais da organização: unificações
    // anteriores no mesmo passe podem ter tirado membros do grupo ou levado a chave
    // para outro sobrevivente. Depois trava quem ainda colide e confere de novo.
    async fn merge_live_group(
        &self,
        organization_id: Uuid,
        group: &DuplicateGroup,
    ) -> Result<Option<MergeResult>, AppError> {
        let mut tx = self.store.begin(organization_id).await?;

        let live = match Self::lock_live_group(&mut tx, group).await {
            Ok(live) => live,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        };

        let Some(live) = live else {
            tx.rollback().await?;
            return Ok(None);
        };

        let plan = MergePlan {
            member_ids: live.member_ids(),
            resolution: FieldResolution::OldestWins,
            excluded_phones: Vec::new(),
            excluded_emails: Vec::new(),
        };
        let result = Self::commit_group(&mut tx, live.members, &plan, &self.default_country_code).await;

        self.finish(tx, result, &group.label()).await.map(Some)
    }

    async fn lock_live_group(
        tx: &mut S::Tx,
        group: &DuplicateGroup,
    ) -> Result<Option<DuplicateGroup>, AppError> {
        let current = tx.list_contact_records().await?;
        let Some(candidate) = find_duplicate_groups(&current)
            .into_iter()
            .find(|g| g.match_type == group.match_type && g.key == group.key)
        else {
            return Ok(None);
        };

        let locked = tx.lock_contact_records(&candidate.member_ids()).await?;
        Ok(find_duplicate_groups(&locked)
            .into_iter()
            .find(|g| g.match_type == group.match_type && g.key == group.key))
    }

    async fn finish(
        &self,
        tx: S::Tx,
        result: Result<MergeResult, AppError>,
        label: &str,
    ) -> Result<MergeResult, AppError> {
        match result {
            Ok(merged) => {
                tx.commit().await?;
                tracing::info!(
                    "🔗 Grupo {} unificado: sobrevivente {}, {} contato(s) removido(s)",
                    label,
                    merged.survivor_id,
                    merged.contacts_removed
                );
                Ok(merged)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!("Rollback da unificação falhou: {}", rollback_err);
                }
                tracing::error!("❌ Unificação do grupo {} falhou: {}", label, e);
                Err(e)
            }
        }
    }

    /// Passos de escrita da unificação, todos na mesma transação.
    async fn commit_group(
        tx: &mut S::Tx,
        members: Vec<ContactRecord>,
        plan: &MergePlan,
        default_country_code: &str,
    ) -> Result<MergeResult, AppError> {
        if members.len() < 2 {
            return Err(AppError::MergeGroupTooSmall);
        }

        let (survivor_id, fields) = resolve_fields(&members, &plan.resolution)?;
        let secondary_ids: Vec<Uuid> = members
            .iter()
            .map(ContactRecord::id)
            .filter(|id| *id != survivor_id)
            .collect();

        // 1. Campos escalares
        tx.update_contact_fields(survivor_id, &fields).await?;

        // 2. União de telefones e e-mails
        let union = union_children(
            survivor_id,
            &members,
            &plan.excluded_phones,
            &plan.excluded_emails,
            default_country_code,
        );
        let mut phones_added = 0;
        for phone in &union.add_phones {
            if tx.insert_phone(survivor_id, phone).await? {
                phones_added += 1;
            }
        }
        let mut emails_added = 0;
        for email in &union.add_emails {
            if tx.insert_email(survivor_id, email).await? {
                emails_added += 1;
            }
        }
        for number in &union.drop_phones {
            tx.delete_phone(survivor_id, number).await?;
        }
        for address in &union.drop_emails {
            tx.delete_email(survivor_id, address).await?;
        }

        // 3. Re-link, tabela por tabela
        let mut relinked = BTreeMap::new();
        for target in RelinkTarget::ALL {
            let moved = tx.relink(target, &secondary_ids, survivor_id).await?;
            relinked.insert(target.table().to_string(), moved);
        }

        // 4. Remove os secundários
        let contacts_removed = tx.delete_contacts(&secondary_ids).await?;
        if contacts_removed != secondary_ids.len() as u64 {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "esperava remover {} contato(s), removeu {}",
                secondary_ids.len(),
                contacts_removed
            )));
        }

        Ok(MergeResult {
            survivor_id,
            message: format!("{} contato(s) unificado(s) em {}", contacts_removed, survivor_id),
            merged_ids: secondary_ids,
            contacts_removed,
            phones_added,
            emails_added,
            relinked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::{
        common::normalize::DEFAULT_COUNTRY_CODE,
        db::memory_store::MemoryStore,
        models::contact::{ContactFields, ContactType, Personality},
    };

    fn named(name: &str) -> ContactFields {
        let mut fields = ContactFields::individual();
        fields.full_name = Some(name.to_string());
        fields
    }

    fn plan(ids: &[Uuid], resolution: FieldResolution) -> MergePlan {
        MergePlan {
            member_ids: ids.to_vec(),
            resolution,
            excluded_phones: Vec::new(),
            excluded_emails: Vec::new(),
        }
    }

    async fn records(store: &MemoryStore, org: Uuid) -> Vec<ContactRecord> {
        let mut tx = store.begin(org).await.unwrap();
        tx.list_contact_records().await.unwrap()
    }

    #[tokio::test]
    async fn groups_by_each_key_independently() {
        let store = MemoryStore::new();
        let org = store.add_organization();

        let mut with_cpf = named("Ana Silva");
        with_cpf.cpf = Some("123.456.789-09".into());
        let a = store.seed_contact(org, with_cpf, &["5533988881111"], &[]);

        let mut same_cpf = named("  ANA   silva ");
        same_cpf.cpf = Some("12345678909".into());
        let b = store.seed_contact(org, same_cpf, &["5533977772222"], &[]);

        let c = store.seed_contact(org, named("Carlos"), &["5533988881111"], &[]);
        store.seed_contact(org, named("Sozinho"), &["5511900000000"], &[]);

        let groups = find_duplicate_groups(&records(&store, org).await);
        let summary: Vec<(MatchType, String, Vec<Uuid>)> = groups
            .iter()
            .map(|g| (g.match_type, g.key.clone(), g.member_ids()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (MatchType::Cpf, "12345678909".to_string(), vec![a, b]),
                (MatchType::Phone, "5533988881111".to_string(), vec![a, c]),
                (MatchType::Name, "ana silva".to_string(), vec![a, b]),
            ]
        );
        assert_eq!(groups[0].key_display, "123.456.789-09");
        assert_eq!(groups[1].key_display, "+55 (33) 98888-1111");
        assert_eq!(groups[1].label(), "phone:5533988881111");
    }

    #[tokio::test]
    async fn invalid_documents_do_not_form_groups() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        for cpf in ["000.000.000-00", "00000000000", "123"] {
            let mut fields = ContactFields::individual();
            fields.cpf = Some(cpf.to_string());
            store.seed_contact(org, fields, &[], &[]);
        }

        assert!(find_duplicate_groups(&records(&store, org).await).is_empty());
    }

    #[tokio::test]
    async fn companies_group_by_cnpj_legal_and_trade_name() {
        let store = MemoryStore::new();
        let org = store.add_organization();

        let company = |cnpj: &str, legal: &str, trade: &str| {
            let mut fields = ContactFields::individual();
            fields.personality = Personality::Organization;
            fields.cnpj = Some(cnpj.to_string());
            fields.legal_name = Some(legal.to_string());
            fields.trade_name = Some(trade.to_string());
            fields
        };
        let a = store.seed_contact(
            org,
            company("11.222.333/0001-81", "Horizonte Imoveis LTDA", "Horizonte"),
            &[],
            &[],
        );
        let b = store.seed_contact(
            org,
            company("11222333000181", "  horizonte   imoveis ltda ", "HORIZONTE "),
            &[],
            &[],
        );
        store.seed_contact(org, company("00.000.000/0000-00", "Outra SA", "Outra"), &[], &[]);

        let groups = find_duplicate_groups(&records(&store, org).await);
        let summary: Vec<(MatchType, String, String, Vec<Uuid>)> = groups
            .iter()
            .map(|g| (g.match_type, g.key.clone(), g.key_display.clone(), g.member_ids()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (
                    MatchType::Cnpj,
                    "11222333000181".to_string(),
                    "11.222.333/0001-81".to_string(),
                    vec![a, b]
                ),
                (
                    MatchType::LegalName,
                    "horizonte imoveis ltda".to_string(),
                    "Horizonte Imoveis LTDA".to_string(),
                    vec![a, b]
                ),
                (
                    MatchType::TradeName,
                    "horizonte".to_string(),
                    "Horizonte".to_string(),
                    vec![a, b]
                ),
            ]
        );
    }

    #[tokio::test]
    async fn merge_unions_children_without_duplicates() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        let x = store.seed_contact(org, named("Ana"), &["551111111111"], &["ana@x.com"]);
        let y = store.seed_contact(org, named("Ana"), &["552222222222"], &["ANA@x.com"]);
        let z = store.seed_contact(org, named("Ana"), &["551111111111", "553333333333"], &["ana@y.com"]);

        let result = DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE)
            .merge(org, plan(&[x, y, z], FieldResolution::OldestWins))
            .await
            .unwrap();

        assert_eq!(result.survivor_id, x);
        assert_eq!(result.contacts_removed, 2);
        assert_eq!(result.phones_added, 2);
        assert_eq!(
            store.phones_of(x),
            vec!["551111111111", "552222222222", "553333333333"]
        );
        assert_eq!(store.emails_of(x), vec!["ana@x.com", "ana@y.com"]);
        assert_eq!(store.contacts(org).len(), 1);
    }

    #[tokio::test]
    async fn merge_relinks_every_reference_and_deletes_secondaries() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        let survivor = store.seed_contact(org, named("Ana"), &[], &[]);
        let secondary = store.seed_contact(org, named("Ana"), &[], &[]);

        store.seed_child(org, RelinkTarget::Notes, secondary, "ligar amanhã");
        store.seed_child(org, RelinkTarget::Activities, secondary, "visita");
        store.seed_child(org, RelinkTarget::WhatsappConversations, secondary, "wa");
        let employee = store.seed_employee(org, "Ana", None, None);
        store.link_seeded_employee(employee, secondary);

        let result = DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE)
            .merge(org, plan(&[survivor, secondary], FieldResolution::OldestWins))
            .await
            .unwrap();

        for target in RelinkTarget::ALL {
            assert!(
                store.referenced_contacts(target).iter().all(|id| *id == survivor),
                "{} ainda aponta para o secundário",
                target.table()
            );
        }
        assert_eq!(result.relinked["notes"], 1);
        assert_eq!(result.relinked["activities"], 1);
        assert_eq!(result.relinked["employees"], 1);
        assert_eq!(store.employee(employee).unwrap().contact_id, Some(survivor));
        assert!(store.contact(secondary).is_none());
        assert_eq!(result.merged_ids, vec![secondary]);
    }

    #[tokio::test]
    async fn funnel_cards_keep_one_per_funnel() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        let (_, stages) = store.seed_funnel(org, "Funil de Vendas", &["Entrada", "Negociação"]);
        let (_, other_stages) = store.seed_funnel(org, "Locação", &["Entrada"]);
        let survivor = store.seed_contact(org, named("Ana"), &[], &[]);
        let secondary = store.seed_contact(org, named("Ana"), &[], &[]);

        let kept = store.seed_card(org, &stages[1], survivor);
        store.seed_card(org, &stages[0], secondary);
        let moved = store.seed_card(org, &other_stages[0], secondary);

        DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE)
            .merge(org, plan(&[survivor, secondary], FieldResolution::OldestWins))
            .await
            .unwrap();

        let mut cards: Vec<(Uuid, Uuid)> = store.cards(org).iter().map(|c| (c.id, c.contact_id)).collect();
        cards.sort();
        let mut expected = vec![(kept, survivor), (moved, survivor)];
        expected.sort();
        assert_eq!(cards, expected);
    }

    #[tokio::test]
    async fn failed_relink_leaves_the_group_untouched() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        let survivor = store.seed_contact(org, named("Ana"), &["551111111111"], &[]);
        let mut donor = named("Ana");
        donor.cpf = Some("12345678909".into());
        let secondary = store.seed_contact(org, donor, &["552222222222"], &[]);
        store.seed_child(org, RelinkTarget::Notes, secondary, "nota");
        store.seed_child(org, RelinkTarget::Activities, secondary, "tarefa");

        let before = store.snapshot();
        store.fail_relink(RelinkTarget::Activities);

        let err = DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE)
            .merge(org, plan(&[survivor, secondary], FieldResolution::OldestWins))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));

        let after = store.snapshot();
        assert_eq!(after.contacts, before.contacts);
        assert_eq!(after.phones, before.phones);
        assert_eq!(after.notes, before.notes);
        assert_eq!(store.contact(survivor).unwrap().fields.cpf, None);
        assert_eq!(store.phones_of(survivor), vec!["551111111111"]);
    }

    #[tokio::test]
    async fn foreign_tenant_id_fails_the_whole_request() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        let other_org = store.add_organization();
        let mine = store.seed_contact(org, named("Ana"), &[], &[]);
        let also_mine = store.seed_contact(org, named("Ana"), &[], &[]);
        let theirs = store.seed_contact(other_org, named("Ana"), &[], &[]);

        let err = DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE)
            .merge(org, plan(&[mine, also_mine, theirs], FieldResolution::OldestWins))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ContactNotFound(id) if id == theirs));
        assert_eq!(store.contacts(org).len(), 2);
        assert_eq!(store.contacts(other_org).len(), 1);
    }

    #[tokio::test]
    async fn oldest_wins_but_empty_fields_take_the_next_value() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        let oldest = store.seed_contact(org, named("Ana Silva"), &[], &[]);
        let mut newer = named("Ana S.");
        newer.cpf = Some("12345678909".into());
        newer.occupation = Some("Professora".into());
        newer.contact_type = ContactType::Client;
        let newer = store.seed_contact(org, newer, &[], &[]);

        DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE)
            .merge(org, plan(&[newer, oldest], FieldResolution::OldestWins))
            .await
            .unwrap();

        let survivor = store.contact(oldest).unwrap();
        assert_eq!(survivor.fields.full_name.as_deref(), Some("Ana Silva"));
        assert_eq!(survivor.fields.cpf.as_deref(), Some("12345678909"));
        assert_eq!(survivor.fields.occupation.as_deref(), Some("Professora"));
        // Campos obrigatórios nunca estão vazios: vale o do mais antigo
        assert_eq!(survivor.fields.contact_type, ContactType::Contact);
    }

    #[tokio::test]
    async fn manual_merge_takes_each_field_from_one_source() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        let mut first = named("Ana Silva");
        first.occupation = Some("Professora".into());
        let first = store.seed_contact(org, first, &["551111111111"], &[]);
        let mut second = named("ANA SILVA");
        second.cpf = Some("12345678909".into());
        let second = store.seed_contact(org, second, &["552222222222"], &[]);

        let resolution = FieldResolution::Manual {
            survivor_id: second,
            field_sources: HashMap::from([(MergeField::FullName, first), (MergeField::Occupation, first)]),
        };
        let mut merge_plan = plan(&[first, second], resolution);
        merge_plan.excluded_phones = vec!["+55 (11) 1111-1111".into()];

        let result = DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE).merge(org, merge_plan).await.unwrap();

        assert_eq!(result.survivor_id, second);
        let survivor = store.contact(second).unwrap();
        assert_eq!(survivor.fields.full_name.as_deref(), Some("Ana Silva"));
        assert_eq!(survivor.fields.occupation.as_deref(), Some("Professora"));
        assert_eq!(survivor.fields.cpf.as_deref(), Some("12345678909"));
        assert_eq!(store.phones_of(second), vec!["552222222222"]);
        assert!(store.contact(first).is_none());
    }

    #[tokio::test]
    async fn excluded_phones_match_in_national_form() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        let a = store.seed_contact(org, named("Ana"), &["5533988881111"], &[]);
        let b = store.seed_contact(org, named("Ana"), &["5511987654321"], &[]);

        let mut merge_plan = plan(&[a, b], FieldResolution::OldestWins);
        merge_plan.excluded_phones = vec!["(33) 98888-1111".into(), "(11) 98765-4321".into()];

        let result = DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE)
            .merge(org, merge_plan)
            .await
            .unwrap();

        assert_eq!(result.phones_added, 0);
        assert!(store.phones_of(a).is_empty());
    }

    #[tokio::test]
    async fn manual_merge_validates_its_plan() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        let a = store.seed_contact(org, named("Ana"), &[], &[]);
        let b = store.seed_contact(org, named("Ana"), &[], &[]);
        let outsider = Uuid::new_v4();
        let service = DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE);

        let err = service
            .merge(org, plan(&[a, a], FieldResolution::OldestWins))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MergeGroupTooSmall));

        let err = service
            .merge(
                org,
                plan(&[a, b], FieldResolution::Manual { survivor_id: outsider, field_sources: HashMap::new() }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SurvivorNotInGroup(id) if id == outsider));

        let err = service
            .merge(
                org,
                plan(
                    &[a, b],
                    FieldResolution::Manual {
                        survivor_id: a,
                        field_sources: HashMap::from([(MergeField::Cpf, outsider)]),
                    },
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidMergeField { ref field, .. } if field == "cpf"));

        assert_eq!(store.contacts(org).len(), 2);
    }

    #[tokio::test]
    async fn merge_all_refetches_groups_between_merges() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        // Mesmo telefone e mesmo nome: dois grupos com os mesmos membros
        let x = store.seed_contact(org, named("Ana"), &["5533988881111"], &[]);
        store.seed_contact(org, named("ana"), &["5533988881111"], &[]);
        let p = store.seed_contact(org, named("Bruno"), &[], &["b@x.com"]);
        let mut with_cpf = named("Bruno Lima");
        with_cpf.cpf = Some("98765432100".into());
        store.seed_contact(org, with_cpf, &[], &[]);
        let mut same_cpf = named("Outro");
        same_cpf.cpf = Some("987.654.321-00".into());
        let q = store.seed_contact(org, same_cpf, &[], &[]);

        let report = DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE).merge_all(org).await.unwrap();

        assert_eq!(report.groups_found, 3);
        assert_eq!(report.groups_merged, 2);
        assert_eq!(report.groups_skipped, 1);
        assert_eq!(report.contacts_removed, 2);
        assert!(store.contact(x).is_some());
        assert!(store.contact(p).is_some());
        assert!(store.contact(q).is_none());
        assert_eq!(store.contacts(org).len(), 3);
    }

    #[tokio::test]
    async fn merge_all_follows_keys_carried_over_by_earlier_merges() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        let mut oldest = named("Ana");
        oldest.cpf = Some("12345678909".into());
        let x = store.seed_contact(org, oldest, &[], &[]);
        let mut same_cpf = named("Bia");
        same_cpf.cpf = Some("123.456.789-09".into());
        let y = store.seed_contact(org, same_cpf, &["5533988881111"], &[]);
        let z = store.seed_contact(org, named("Carla"), &["5533988881111"], &[]);

        // CPF une y em x; o telefone de y passa para x e continua colidindo com z
        let report = DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE)
            .merge_all(org)
            .await
            .unwrap();

        assert_eq!(report.groups_found, 2);
        assert_eq!(report.groups_merged, 2);
        assert_eq!(report.groups_skipped, 0);
        assert_eq!(report.contacts_removed, 2);
        assert_eq!(report.merges[1].survivor_id, x);
        assert_eq!(report.merges[1].merged_ids, vec![z]);
        assert!(store.contact(y).is_none());
        assert!(store.contact(z).is_none());
        assert_eq!(store.phones_of(x), vec!["5533988881111"]);
        assert!(find_duplicate_groups(&records(&store, org).await).is_empty());
    }

    #[tokio::test]
    async fn merge_all_reports_the_failing_group() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        store.seed_contact(org, named("Ana"), &[], &[]);
        store.seed_contact(org, named("Ana"), &[], &[]);
        store.fail_relink(RelinkTarget::Notes);

        let err = DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE).merge_all(org).await.unwrap_err();

        match err {
            AppError::BatchMergeFailed { group, merged_before, .. } => {
                assert_eq!(group, "name:ana");
                assert_eq!(merged_before, 0);
            }
            other => panic!("erro inesperado: {other:?}"),
        }
        assert_eq!(store.contacts(org).len(), 2);
    }

    #[tokio::test]
    async fn find_group_reads_live_data() {
        let store = MemoryStore::new();
        let org = store.add_organization();
        store.seed_contact(org, named("Ana"), &["5533988881111"], &[]);
        store.seed_contact(org, named("Bia"), &["5533988881111"], &[]);
        let service = DedupService::new(store.clone(), DEFAULT_COUNTRY_CODE);

        let group = service.find_group(org, MatchType::Phone, "5533988881111").await.unwrap();
        assert_eq!(group.members.len(), 2);

        let err = service.find_group(org, MatchType::Name, "ana").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateGroupNotFound));
    }
}
