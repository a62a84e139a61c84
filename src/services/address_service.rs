use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::address::{AddressList, CreateAddressRequest},
    entity::address_book::{ActiveModel as AddressActive, Column as AddressCol, Entity as AddressBook},
    error::{AppError, AppResult, ValidationError},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn add_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    if payload.consignee.trim().is_empty() {
        return Err(ValidationError::InvalidField("consignee must not be empty").into());
    }
    if payload.phone.trim().is_empty() {
        return Err(ValidationError::InvalidField("phone must not be empty").into());
    }

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        consignee: Set(payload.consignee),
        phone: Set(payload.phone),
        province_name: Set(payload.province_name),
        city_name: Set(payload.city_name),
        district_name: Set(payload.district_name),
        detail: Set(payload.detail),
        label: Set(payload.label),
        created_at: Set(state.clock.now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Address saved",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = AddressBook::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .order_by_asc(AddressCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        AddressList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let address = AddressBook::find()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(id))
                .add(AddressCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "OK",
        Address::from(address),
        Some(Meta::empty()),
    ))
}
